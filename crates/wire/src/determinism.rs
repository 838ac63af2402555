// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Determinism envelope and validation configuration DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use retrace_core::ReproId;

/// Resource caps applied to the isolated container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceCaps {
    /// CPU quota as a fraction of one core.
    pub cpu_limit: f64,
    pub memory_limit_mb: u64,
    pub disk_quota_mb: u64,
}

impl Default for ResourceCaps {
    fn default() -> Self {
        Self { cpu_limit: 0.8, memory_limit_mb: 1024, disk_quota_mb: 500 }
    }
}

/// Per-layer toggles and knobs for the deterministic envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeterminismConfig {
    #[serde(default = "default_true")]
    pub enable_network_shaping: bool,
    #[serde(default = "default_true")]
    pub enable_time_freezing: bool,
    #[serde(default = "default_true")]
    pub enable_resource_limits: bool,
    #[serde(default = "default_latency")]
    pub network_latency_ms: u64,
    #[serde(default = "default_bandwidth")]
    pub network_bandwidth_kbps: u64,
    /// Explicit instant to freeze the wall clock at; otherwise now + offset.
    #[serde(default)]
    pub fake_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fake_time_offset_hours: i64,
    #[serde(default)]
    pub caps: ResourceCaps,
}

impl Default for DeterminismConfig {
    fn default() -> Self {
        Self {
            enable_network_shaping: true,
            enable_time_freezing: true,
            enable_resource_limits: true,
            network_latency_ms: default_latency(),
            network_bandwidth_kbps: default_bandwidth(),
            fake_time: None,
            fake_time_offset_hours: 0,
            caps: ResourceCaps::default(),
        }
    }
}

/// One determinism-controlled test execution request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    pub test_id: String,
    #[serde(default = "default_image")]
    pub base_image: String,
    #[serde(default)]
    pub test_script: Option<String>,
    #[serde(default = "default_command")]
    pub test_command: String,
    #[serde(default)]
    pub determinism: DeterminismConfig,
    #[serde(default = "default_monitor_interval")]
    pub monitoring_interval_secs: u64,
    /// Host directory bind-mounted at /work inside the container, for staged
    /// artifacts and captured recordings.
    #[serde(default)]
    pub mount_dir: Option<String>,
}

impl TestConfig {
    pub fn new(test_id: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            base_image: default_image(),
            test_script: None,
            test_command: default_command(),
            determinism: DeterminismConfig::default(),
            monitoring_interval_secs: default_monitor_interval(),
            mount_dir: None,
        }
    }
}

/// Validation cycle request for one repro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub repro_id: ReproId,
    #[serde(default = "default_runs")]
    pub runs: u32,
    #[serde(default)]
    pub determinism: DeterminismConfig,
}

fn default_true() -> bool {
    true
}

fn default_latency() -> u64 {
    50
}

fn default_bandwidth() -> u64 {
    1000
}

fn default_image() -> String {
    "node:18-alpine".to_string()
}

fn default_command() -> String {
    "npm test".to_string()
}

fn default_monitor_interval() -> u64 {
    5
}

fn default_runs() -> u32 {
    5
}

#[cfg(test)]
#[path = "determinism_tests.rs"]
mod tests;
