// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value cache for derived, TTL-bounded state.
//!
//! Eviction is always safe: nothing here is authoritative.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Redis-backed cache handle. Clones share the underlying connection, which
/// reconnects on its own.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
}

impl Cache {
    /// Connect to `redis://<host>:<port>`.
    pub async fn connect(host: &str, port: u16) -> Result<Self, StorageError> {
        let client = redis::Client::open(format!("redis://{}:{}", host, port))?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Store a JSON value with a TTL in seconds.
    pub async fn put_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), StorageError> {
        let payload = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, payload, ttl_secs).await?;
        Ok(())
    }

    /// Fetch a JSON value, `None` when the key is absent or expired.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(key).await?;
        match payload {
            Some(p) => Ok(Some(serde_json::from_str(&p)?)),
            None => Ok(None),
        }
    }

    /// Drop a key. Missing keys are fine.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}
