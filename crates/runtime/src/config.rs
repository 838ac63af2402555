// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the worker runtime.

use std::path::PathBuf;
use std::time::Duration;

use retrace_storage::db::DbConfig;
use retrace_storage::object::ObjectConfig;

/// Runtime configuration shared by every worker role.
///
/// Component-specific knobs (validation runs, chunk sizes, network interface)
/// are read by the owning worker on top of this.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub db: DbConfig,
    pub redis_host: String,
    pub redis_port: u16,
    pub nats_url: String,
    pub object: ObjectConfig,
    pub temp_dir: PathBuf,
    pub max_concurrent_tasks: usize,
    pub log_level: String,
    /// Deliveries after which a message is quarantined.
    pub redelivery_budget: u64,
    /// Grace period for in-flight handlers on shutdown.
    pub drain_timeout: Duration,
}

impl WorkerConfig {
    /// Load from the environment with the pipeline's defaults.
    pub fn load() -> Self {
        Self {
            db: DbConfig::new(
                &var("DB_HOST", "localhost"),
                parse_var("DB_PORT", 5432),
                &var("DB_NAME", "bug_repro"),
                &var("DB_USERNAME", "postgres"),
                &var("DB_PASSWORD", "postgres"),
            ),
            redis_host: var("REDIS_HOST", "localhost"),
            redis_port: parse_var("REDIS_PORT", 6379),
            nats_url: var("NATS_URL", "nats://localhost:4222"),
            object: ObjectConfig {
                endpoint: opt_var("S3_ENDPOINT"),
                access_key: opt_var("S3_ACCESS_KEY"),
                secret_key: opt_var("S3_SECRET_KEY"),
                bucket: var("S3_BUCKET", "bug-repro-artifacts"),
            },
            temp_dir: PathBuf::from(var("TEMP_DIR", "/tmp/retrace")),
            max_concurrent_tasks: parse_var("MAX_CONCURRENT_TASKS", 5),
            log_level: var("LOG_LEVEL", "info"),
            redelivery_budget: parse_var("REDELIVERY_BUDGET", 5),
            drain_timeout: Duration::from_millis(parse_var("DRAIN_TIMEOUT_MS", 30_000)),
        }
    }
}

fn var(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn opt_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
