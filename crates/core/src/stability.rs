// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stability scoring over a set of validation runs.

use serde::{Deserialize, Serialize};

use crate::run::RunRecord;

/// Classification buckets over the pass rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityClass {
    Stable,
    MostlyStable,
    Unstable,
    VeryUnstable,
}

crate::simple_display! {
    StabilityClass {
        Stable => "stable",
        MostlyStable => "mostly_stable",
        Unstable => "unstable",
        VeryUnstable => "very_unstable",
    }
}

impl StabilityClass {
    /// stable at 1.0, mostly_stable ≥ 0.8, unstable ≥ 0.5, very_unstable below.
    pub fn from_pass_rate(rate: f64) -> Self {
        if rate >= 1.0 {
            Self::Stable
        } else if rate >= 0.8 {
            Self::MostlyStable
        } else if rate >= 0.5 {
            Self::Unstable
        } else {
            Self::VeryUnstable
        }
    }
}

/// Duration statistics over the completed runs, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerfStats {
    pub mean: f64,
    pub median: f64,
    pub stdev: f64,
    pub min: u64,
    pub max: u64,
}

/// Derived summary of a set of runs. Cached, never authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityRecord {
    /// Fraction of runs that passed.
    pub stability_score: f64,
    /// Variance of the binary pass sequence; 0 when all runs agree.
    pub flaky_score: f64,
    pub consistency_score: f64,
    pub class: StabilityClass,
    pub performance: PerfStats,
    pub total_runs: usize,
    pub passed_runs: usize,
    pub failed_runs: usize,
}

/// Compute the stability summary over completed runs.
///
/// An empty run set scores 0.0 stability and full flakiness, matching the
/// "nothing demonstrated" reading rather than a perfect score.
pub fn stability_metrics(runs: &[RunRecord]) -> StabilityRecord {
    if runs.is_empty() {
        return StabilityRecord {
            stability_score: 0.0,
            flaky_score: 1.0,
            consistency_score: 0.0,
            class: StabilityClass::VeryUnstable,
            performance: PerfStats::default(),
            total_runs: 0,
            passed_runs: 0,
            failed_runs: 0,
        };
    }

    let total = runs.len();
    let passed = runs.iter().filter(|r| r.passed).count();
    let pass_rate = passed as f64 / total as f64;

    // Population variance of the 0/1 sequence; identical outcomes are not flaky.
    let flaky_score = if passed == 0 || passed == total {
        0.0
    } else {
        binary_variance(pass_rate)
    };

    let durations: Vec<u64> = runs.iter().map(|r| r.duration_ms).collect();

    StabilityRecord {
        stability_score: pass_rate,
        flaky_score,
        consistency_score: 1.0 - flaky_score,
        class: StabilityClass::from_pass_rate(pass_rate),
        performance: perf_stats(&durations),
        total_runs: total,
        passed_runs: passed,
        failed_runs: total - passed,
    }
}

/// Population variance of a Bernoulli sample with the given mean: p(1-p).
fn binary_variance(p: f64) -> f64 {
    p * (1.0 - p)
}

fn perf_stats(durations: &[u64]) -> PerfStats {
    if durations.is_empty() {
        return PerfStats::default();
    }
    let n = durations.len();
    let mean = durations.iter().sum::<u64>() as f64 / n as f64;

    let mut sorted = durations.to_vec();
    sorted.sort_unstable();
    let median = if n % 2 == 1 {
        sorted[n / 2] as f64
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
    };

    // Sample stdev; a single run has no spread to report.
    let stdev = if n < 2 {
        0.0
    } else {
        let sum_sq: f64 = durations.iter().map(|&d| (d as f64 - mean).powi(2)).sum();
        (sum_sq / (n - 1) as f64).sqrt()
    };

    PerfStats { mean, median, stdev, min: sorted[0], max: sorted[n - 1] }
}

#[cfg(test)]
#[path = "stability_tests.rs"]
mod tests;
