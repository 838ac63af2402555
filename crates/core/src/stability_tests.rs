// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::repro::ReproId;

fn run(iteration: u32, passed: bool, duration_ms: u64) -> RunRecord {
    RunRecord {
        repro_id: ReproId::new("rp-1"),
        iteration,
        passed,
        duration_ms,
        exit_code: if passed { 0 } else { 1 },
        logs: String::new(),
        video_key: None,
        trace_key: None,
    }
}

fn runs_from_pattern(pattern: &str) -> Vec<RunRecord> {
    pattern
        .chars()
        .enumerate()
        .map(|(i, c)| run(i as u32 + 1, c == 'P', 1000 + i as u64 * 100))
        .collect()
}

#[test]
fn all_passing_is_stable_with_zero_flakiness() {
    let record = stability_metrics(&runs_from_pattern("PPPPP"));
    assert_eq!(record.stability_score, 1.0);
    assert_eq!(record.flaky_score, 0.0);
    assert_eq!(record.consistency_score, 1.0);
    assert_eq!(record.class, StabilityClass::Stable);
}

#[test]
fn all_failing_is_very_unstable_but_not_flaky() {
    let record = stability_metrics(&runs_from_pattern("FFFF"));
    assert_eq!(record.stability_score, 0.0);
    assert_eq!(record.flaky_score, 0.0);
    assert_eq!(record.class, StabilityClass::VeryUnstable);
}

#[test]
fn ppfpf_pattern_matches_expected_scores() {
    // var([1,1,0,1,0]) = 0.24 with pass rate 0.6
    let record = stability_metrics(&runs_from_pattern("PPFPF"));
    assert_eq!(record.stability_score, 0.6);
    assert!((record.flaky_score - 0.24).abs() < 1e-9);
    assert_eq!(record.class, StabilityClass::Unstable);
    assert_eq!(record.passed_runs, 3);
    assert_eq!(record.failed_runs, 2);
}

#[yare::parameterized(
    stable = { 1.0, StabilityClass::Stable },
    mostly = { 0.8, StabilityClass::MostlyStable },
    mostly_high = { 0.9, StabilityClass::MostlyStable },
    unstable = { 0.5, StabilityClass::Unstable },
    very = { 0.49, StabilityClass::VeryUnstable },
    zero = { 0.0, StabilityClass::VeryUnstable },
)]
fn classification_thresholds(rate: f64, class: StabilityClass) {
    assert_eq!(StabilityClass::from_pass_rate(rate), class);
}

#[test]
fn adding_a_passing_run_never_hurts() {
    // Stability monotonicity law: stability_score never decreases and
    // flaky_score never increases when a passing run is appended to a
    // majority-passing set.
    for pattern in ["PPF", "PPFPF", "PPPP", "PF"] {
        let mut runs = runs_from_pattern(pattern);
        let before = stability_metrics(&runs);
        if before.stability_score < 0.5 {
            continue;
        }
        runs.push(run(runs.len() as u32 + 1, true, 1000));
        let after = stability_metrics(&runs);
        assert!(after.stability_score >= before.stability_score, "pattern {pattern}");
        assert!(after.flaky_score <= before.flaky_score + 1e-9, "pattern {pattern}");
    }
}

#[test]
fn perf_stats_cover_spread() {
    let runs = vec![run(1, true, 1000), run(2, true, 1100), run(3, true, 1050)];
    let record = stability_metrics(&runs);
    assert_eq!(record.performance.min, 1000);
    assert_eq!(record.performance.max, 1100);
    assert_eq!(record.performance.median, 1050.0);
    assert!((record.performance.mean - 1050.0).abs() < 1e-9);
    assert!(record.performance.stdev > 0.0);
}

#[test]
fn even_count_median_averages_middle_pair() {
    let runs = vec![run(1, true, 100), run(2, true, 200), run(3, true, 300), run(4, true, 400)];
    assert_eq!(stability_metrics(&runs).performance.median, 250.0);
}

#[test]
fn empty_run_set_scores_nothing() {
    let record = stability_metrics(&[]);
    assert_eq!(record.stability_score, 0.0);
    assert_eq!(record.flaky_score, 1.0);
    assert_eq!(record.total_runs, 0);
}
