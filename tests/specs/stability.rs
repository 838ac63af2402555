// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation stability scoring over run patterns.

use retrace_core::{stability_metrics, ReproId, RunRecord, StabilityClass};
use retrace_workers::validate::should_minimize;

fn runs(pattern: &str) -> Vec<RunRecord> {
    pattern
        .chars()
        .enumerate()
        .map(|(i, c)| RunRecord {
            repro_id: ReproId::new("rp-1"),
            iteration: i as u32 + 1,
            passed: c == 'P',
            duration_ms: 1000,
            exit_code: if c == 'P' { 0 } else { 1 },
            logs: String::new(),
            video_key: None,
            trace_key: None,
        })
        .collect()
}

#[test]
fn ppfpf_is_unstable_with_expected_scores() {
    let record = stability_metrics(&runs("PPFPF"));
    assert_eq!(record.stability_score, 0.6);
    assert!((record.flaky_score - 0.24).abs() < 1e-9);
    assert_eq!(record.class, StabilityClass::Unstable);
}

#[test]
fn ppfpf_triggers_minimization_at_default_threshold() {
    let record = stability_metrics(&runs("PPFPF"));
    assert!(should_minimize(record.flaky_score, record.failed_runs, 0.3));
}

#[test]
fn all_passing_is_stable_and_skips_minimization() {
    let record = stability_metrics(&runs("PPPPP"));
    assert_eq!(record.flaky_score, 0.0);
    assert_eq!(record.class, StabilityClass::Stable);
    assert!(!should_minimize(record.flaky_score, record.failed_runs, 0.3));
}
