// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Determinism controller: run a caller-supplied test body under the full
//! envelope and cache the execution report.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use retrace_envelope::{EnvelopeExecutor, ResourceLog, ResourceSample};
use retrace_runtime::{Handler, WorkerContext, WorkerError};
use retrace_storage::{keys, Cache};
use retrace_wire::{decode, DeterminismRequest, Subject};

/// Envelope knobs owned by this role.
#[derive(Debug, Clone)]
pub struct DeterminismOptions {
    pub network_interface: String,
}

impl DeterminismOptions {
    pub fn load() -> Self {
        Self {
            network_interface: std::env::var("NETWORK_INTERFACE")
                .unwrap_or_else(|_| "eth0".to_string()),
        }
    }
}

/// Resource log writing monitor samples to the cache under
/// `resource_stats:<test_id>` with the 5-minute TTL.
pub struct CacheResourceLog {
    cache: Cache,
}

impl CacheResourceLog {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ResourceLog for CacheResourceLog {
    async fn record(&self, test_id: &str, sample: &ResourceSample) {
        let key = keys::resource_stats_key(test_id);
        if let Err(err) = self.cache.put_json(&key, sample, keys::ttl::RESOURCE_STATS).await {
            tracing::warn!(key, error = %err, "resource sample write failed");
        }
    }
}

pub struct DeterminismHandler {
    ctx: Arc<WorkerContext>,
    executor: Arc<EnvelopeExecutor>,
}

impl DeterminismHandler {
    pub fn new(ctx: Arc<WorkerContext>, executor: Arc<EnvelopeExecutor>) -> Self {
        Self { ctx, executor }
    }
}

#[async_trait]
impl Handler for DeterminismHandler {
    fn role(&self) -> &'static str {
        "determinism"
    }

    fn subject(&self) -> Subject {
        Subject::DeterminismControl
    }

    async fn handle(&self, payload: &[u8]) -> Result<(), WorkerError> {
        let request: DeterminismRequest = decode(payload)?;
        let config = request.test_config;

        let report = self.executor.execute(&config).await;

        let key = keys::test_result_key(&config.test_id);
        self.ctx
            .cache
            .put_json(&key, &report, keys::ttl::TEST_RESULT)
            .await?;

        info!(
            test_id = %config.test_id,
            status = %report.status,
            "determinism execution recorded"
        );
        Ok(())
    }
}
