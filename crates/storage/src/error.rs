// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage error type shared by the three stores.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("object store error: {0}")]
    Object(String),

    #[error("object not found: {0}")]
    ObjectMissing(String),

    #[error("row not found: {0}")]
    RowMissing(String),

    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Missing rows and artifacts are terminal for a message; everything else
    /// is worth a retry.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            Self::RowMissing(_) | Self::ObjectMissing(_) | Self::Serde(_) | Self::Invalid(_)
        )
    }
}
