// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Postgres pool construction.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;

use crate::error::StorageError;

/// Connection parameters for the relational store.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn new(host: &str, port: u16, name: &str, user: &str, password: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            name: name.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            max_connections: 10,
        }
    }
}

/// Open a pool sized for short-lived per-handler transactions.
pub async fn connect_pool(config: &DbConfig) -> Result<PgPool, StorageError> {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .password(&config.password);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;

    Ok(pool)
}
