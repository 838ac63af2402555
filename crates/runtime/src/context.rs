// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared collaborator handles a worker role passes to its handler.

use sqlx::PgPool;

use retrace_storage::{Cache, ObjectStore};

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::tempdir::TempScope;

/// The store handles plus runtime config, built once at worker start and
/// shared by every in-flight handler invocation.
pub struct WorkerContext {
    pub db: PgPool,
    pub cache: Cache,
    pub objects: ObjectStore,
    pub config: WorkerConfig,
}

impl WorkerContext {
    /// Open the relational store, cache and object store.
    ///
    /// The database pool is lazy: the first query establishes the
    /// connection, and a store that is down at boot surfaces as handler
    /// failures (retried messages) rather than a crash loop.
    pub async fn connect(config: WorkerConfig) -> Result<Self, WorkerError> {
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.db.max_connections)
            .connect_lazy_with(
                sqlx::postgres::PgConnectOptions::new()
                    .host(&config.db.host)
                    .port(config.db.port)
                    .database(&config.db.name)
                    .username(&config.db.user)
                    .password(&config.db.password),
            );

        let cache = Cache::connect(&config.redis_host, config.redis_port)
            .await
            .map_err(|err| WorkerError::TransientIo(err.to_string()))?;

        let objects = ObjectStore::connect(&config.object).await;

        Ok(Self { db, cache, objects, config })
    }

    /// Fresh scoped temp directory for one handler invocation.
    pub fn temp_scope(&self, role: &str) -> Result<TempScope, WorkerError> {
        TempScope::create(&self.config.temp_dir, role)
            .map_err(|err| WorkerError::Internal(format!("temp scope: {}", err)))
    }
}
