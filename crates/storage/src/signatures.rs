// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error-signature upserts keyed by content hash.

use sqlx::PgPool;

use retrace_core::{to_pgvector_literal, ErrorSignature};

use crate::error::StorageError;

/// Upsert one clustered signature.
///
/// Conflict on `signature_hash` adds the incoming frequency and refreshes
/// `updated_at`; concurrent writers on the same hash serialize on the row.
pub async fn upsert_signature(
    pool: &PgPool,
    signature: &ErrorSignature,
    embedding: &[f32],
) -> Result<(), StorageError> {
    let components = serde_json::to_value(&signature.key_components)?;

    sqlx::query(
        "INSERT INTO error_signatures (
             signature_hash, report_id, error_type, message, details,
             stack_trace, key_components, severity, frequency, embedding,
             created_at, updated_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10::vector, NOW(), NOW())
         ON CONFLICT (signature_hash)
         DO UPDATE SET
             frequency = error_signatures.frequency + EXCLUDED.frequency,
             updated_at = NOW()",
    )
    .bind(signature.hash.as_str())
    .bind(signature.report_id.as_str())
    .bind(signature.kind.to_string())
    .bind(&signature.message)
    .bind(signature.details.as_deref())
    .bind(signature.stack_trace.as_deref())
    .bind(components)
    .bind(signature.severity.to_string())
    .bind(signature.frequency as i32)
    .bind(to_pgvector_literal(embedding))
    .execute(pool)
    .await?;

    Ok(())
}
