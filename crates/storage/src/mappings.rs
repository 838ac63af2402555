// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mapping rows: written once when the analysis completes.

use sqlx::PgPool;

use crate::error::StorageError;

/// Write the derived fields onto an existing mapping row.
pub async fn complete_mapping(
    pool: &PgPool,
    mapping_id: &str,
    framework_scores: &serde_json::Value,
    module_suggestions: &serde_json::Value,
    doc_results: &serde_json::Value,
    confidence_score: f64,
) -> Result<(), StorageError> {
    let result = sqlx::query(
        "UPDATE mappings
         SET framework_scores = $1, module_suggestions = $2,
             doc_results = $3, confidence_score = $4
         WHERE id = $5",
    )
    .bind(framework_scores)
    .bind(module_suggestions)
    .bind(doc_results)
    .bind(confidence_score)
    .bind(mapping_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::RowMissing(format!("mapping {}", mapping_id)));
    }
    Ok(())
}
