// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use retrace_core::ErrorKind;
use retrace_signals::HashEmbed;
use serial_test::serial;

const LOG_THREE_ERRORS: &str = "\
2024-01-15T10:30:10 ERROR TypeError: Cannot read property 'map' of undefined
2024-01-15T10:30:15 ERROR ReferenceError: userPreferences is not defined
2024-01-15T10:30:20 ERROR TypeError: Cannot read property 'map' of undefined
2024-01-15T10:30:25 INFO Processing completed
";

#[test]
fn log_signal_produces_error_candidates() {
    let report_id = ReportId::new("r-1");
    let candidates = signatures_from_signal(&report_id, SignalKind::Log, LOG_THREE_ERRORS.as_bytes());
    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[0].kind, ErrorKind::TypeError);
    assert_eq!(candidates[1].kind, ErrorKind::ReferenceError);
}

#[test]
fn har_signal_produces_no_candidates() {
    let report_id = ReportId::new("r-1");
    let har = br#"{"log": {"entries": []}}"#;
    assert!(signatures_from_signal(&report_id, SignalKind::Har, har).is_empty());
}

#[test]
fn screenshot_signal_is_skipped() {
    let report_id = ReportId::new("r-1");
    assert!(signatures_from_signal(&report_id, SignalKind::Screenshot, b"png").is_empty());
}

#[test]
fn two_type_errors_cluster_with_frequency_two() {
    // Seed scenario: three ERRORs, two identical TypeErrors, threshold 0.3.
    let report_id = ReportId::new("r-1");
    let candidates = signatures_from_signal(&report_id, SignalKind::Log, LOG_THREE_ERRORS.as_bytes());
    let clustered = cluster_signatures(
        &HashEmbed,
        candidates,
        SignalOptions { similarity_threshold: 0.3, min_samples_cluster: 2 }.cluster_params(),
    );

    assert_eq!(clustered.len(), 2, "expected two persisted rows");
    let type_error = clustered.iter().find(|s| s.kind == ErrorKind::TypeError).unwrap();
    assert_eq!(type_error.frequency, 2);
    let reference = clustered.iter().find(|s| s.kind == ErrorKind::ReferenceError).unwrap();
    assert_eq!(reference.frequency, 1);

    let total: u32 = clustered.iter().map(|s| s.frequency).sum();
    assert_eq!(total, 3, "frequencies must cover every input signature");
}

#[test]
#[serial]
fn options_load_defaults() {
    std::env::remove_var("SIMILARITY_THRESHOLD");
    std::env::remove_var("MIN_SAMPLES_CLUSTER");
    let options = SignalOptions::load();
    assert_eq!(options.similarity_threshold, 0.3);
    assert_eq!(options.min_samples_cluster, 2);
}
