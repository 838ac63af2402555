// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource sampling during envelope execution.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Warn thresholds per the monitoring contract.
const CPU_WARN_PERCENT: f64 = 90.0;
const MEMORY_WARN_PERCENT: f64 = 85.0;

/// One resource usage sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_used_mb: f64,
    pub disk_percent: f64,
    pub timestamp: DateTime<Utc>,
}

/// Source of usage samples. The production impl reads the host's /proc; a
/// fixed fake drives the tests.
#[async_trait]
pub trait Sampler: Send + Sync {
    async fn sample(&self) -> Option<ResourceSample>;
}

/// Sink the samples are recorded to (the key-value cache in production,
/// keyed `resource_stats:<test_id>` with a 5-minute TTL).
#[async_trait]
pub trait ResourceLog: Send + Sync {
    async fn record(&self, test_id: &str, sample: &ResourceSample);
}

/// Spawn the periodic sampler; the returned token stops it.
pub fn spawn_monitor(
    test_id: String,
    interval: Duration,
    sampler: Arc<dyn Sampler>,
    log: Arc<dyn ResourceLog>,
) -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let Some(sample) = sampler.sample().await else {
                continue;
            };
            if sample.cpu_percent > CPU_WARN_PERCENT {
                warn!(test_id = %test_id, cpu = sample.cpu_percent, "high CPU usage");
            }
            if sample.memory_percent > MEMORY_WARN_PERCENT {
                warn!(test_id = %test_id, memory = sample.memory_percent, "high memory usage");
            }
            log.record(&test_id, &sample).await;
        }
    });
    cancel
}

/// Host sampler reading /proc. Best effort: unreadable counters skip the
/// sample rather than failing the envelope.
#[derive(Clone, Copy, Default)]
pub struct ProcSampler;

#[async_trait]
impl Sampler for ProcSampler {
    async fn sample(&self) -> Option<ResourceSample> {
        let meminfo = tokio::fs::read_to_string("/proc/meminfo").await.ok()?;
        let total_kb = read_meminfo_field(&meminfo, "MemTotal:")?;
        let available_kb = read_meminfo_field(&meminfo, "MemAvailable:")?;
        let used_kb = total_kb.saturating_sub(available_kb);

        let loadavg = tokio::fs::read_to_string("/proc/loadavg").await.ok()?;
        let load_1m: f64 = loadavg.split_whitespace().next()?.parse().ok()?;
        let cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);

        Some(ResourceSample {
            cpu_percent: (load_1m / cpus as f64 * 100.0).min(100.0),
            memory_percent: used_kb as f64 / total_kb as f64 * 100.0,
            memory_used_mb: used_kb as f64 / 1024.0,
            disk_percent: 0.0,
            timestamp: Utc::now(),
        })
    }
}

fn read_meminfo_field(meminfo: &str, field: &str) -> Option<u64> {
    meminfo
        .lines()
        .find(|l| l.starts_with(field))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
