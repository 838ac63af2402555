// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource cap translation to container runtime flags.

use retrace_wire::ResourceCaps;

/// CPU period used for the quota pair, in microseconds.
pub const CPU_PERIOD_US: u64 = 100_000;

/// Translate a fractional CPU limit into the container (period, quota) pair.
pub fn cpu_quota(cpu_limit: f64) -> (u64, u64) {
    let clamped = cpu_limit.clamp(0.01, 64.0);
    (CPU_PERIOD_US, (clamped * CPU_PERIOD_US as f64) as u64)
}

/// Container create arguments for the caps.
pub fn limit_args(caps: &ResourceCaps) -> Vec<String> {
    let (period, quota) = cpu_quota(caps.cpu_limit);
    vec![
        format!("--cpu-period={}", period),
        format!("--cpu-quota={}", quota),
        format!("--memory={}m", caps.memory_limit_mb),
        format!("--memory-swap={}m", caps.memory_limit_mb),
    ]
}

/// Size suffix for the writable tmpfs, bounded by the disk quota.
pub fn tmpfs_size_mb(caps: &ResourceCaps) -> u64 {
    caps.disk_quota_mb.max(1)
}

#[cfg(test)]
#[path = "limits_tests.rs"]
mod tests;
