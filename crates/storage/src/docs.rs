// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document chunk index: writes at index time, cosine search at query time.

use serde::Serialize;
use sqlx::{PgPool, Row};

use retrace_core::to_pgvector_literal;

use crate::error::StorageError;

/// One search hit, similarity = 1 - cosine distance.
#[derive(Debug, Clone, Serialize)]
pub struct DocHit {
    pub file_path: String,
    pub chunk_text: String,
    pub meta: serde_json::Value,
    pub similarity: f64,
}

/// Insert one chunk with its embedding.
pub async fn insert_chunk(
    pool: &PgPool,
    project_id: &str,
    file_path: &str,
    chunk_text: &str,
    embedding: &[f32],
    meta: &serde_json::Value,
) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO doc_chunks (project_id, file_path, chunk_text, embedding, meta)
         VALUES ($1, $2, $3, $4::vector, $5)",
    )
    .bind(project_id)
    .bind(file_path)
    .bind(chunk_text)
    .bind(to_pgvector_literal(embedding))
    .bind(meta)
    .execute(pool)
    .await?;
    Ok(())
}

/// Top-N chunks for a project by ascending cosine distance to the query
/// embedding.
pub async fn search_chunks(
    pool: &PgPool,
    project_id: &str,
    query_embedding: &[f32],
    limit: i64,
) -> Result<Vec<DocHit>, StorageError> {
    let literal = to_pgvector_literal(query_embedding);
    let rows = sqlx::query(
        "SELECT file_path, chunk_text, COALESCE(meta, '{}'::jsonb) AS meta,
                1 - (embedding <=> $1::vector) AS similarity
         FROM doc_chunks
         WHERE project_id = $2
         ORDER BY embedding <=> $1::vector
         LIMIT $3",
    )
    .bind(&literal)
    .bind(project_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut hits = Vec::with_capacity(rows.len());
    for row in rows {
        hits.push(DocHit {
            file_path: row.try_get("file_path")?,
            chunk_text: row.try_get("chunk_text")?,
            meta: row.try_get("meta")?,
            similarity: row.try_get("similarity")?,
        });
    }
    Ok(hits)
}
