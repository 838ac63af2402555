// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log parsing through clustering: three ERRORs, two of them the same
//! TypeError, one ReferenceError, at the default threshold.

use retrace_core::{ClusterParams, ErrorKind, ReportId};
use retrace_signals::{cluster_signatures, extract_signature, parse_log, HashEmbed};

const LOG: &str = "\
2024-01-15T10:30:10 ERROR TypeError: Cannot read property 'map' of undefined
2024-01-15T10:30:15 ERROR ReferenceError: userPreferences is not defined
2024-01-15T10:30:20 ERROR TypeError: Cannot read property 'map' of undefined
2024-01-15T10:30:25 WARN Failed to apply discount coupon
2024-01-15T10:30:30 INFO Processing completed
";

#[test]
fn three_errors_cluster_into_two_rows() {
    let report_id = ReportId::new("r-1");
    let parsed = parse_log(LOG);
    assert_eq!(parsed.summary.error_lines, 3);

    let candidates: Vec<_> =
        parsed.errors().map(|entry| extract_signature(&report_id, entry)).collect();
    assert_eq!(candidates.len(), 3);

    let clustered = cluster_signatures(
        &HashEmbed,
        candidates,
        ClusterParams { eps: 0.3, min_samples: 2 },
    );

    // Two persisted rows: the TypeError representative at frequency 2 and
    // the ReferenceError singleton.
    assert_eq!(clustered.len(), 2);
    let type_error = clustered.iter().find(|s| s.kind == ErrorKind::TypeError).unwrap();
    assert_eq!(type_error.frequency, 2);
    assert!(clustered.iter().any(|s| s.kind == ErrorKind::ReferenceError));
}

#[test]
fn frequency_sum_is_preserved_by_clustering() {
    let report_id = ReportId::new("r-1");
    let parsed = parse_log(LOG);
    let candidates: Vec<_> =
        parsed.errors().map(|entry| extract_signature(&report_id, entry)).collect();
    let input = candidates.len() as u32;

    let clustered =
        cluster_signatures(&HashEmbed, candidates, ClusterParams::default());
    let total: u32 = clustered.iter().map(|s| s.frequency).sum();
    assert_eq!(total, input);
}

#[test]
fn identical_errors_share_a_signature_hash() {
    let report_id = ReportId::new("r-1");
    let parsed = parse_log(LOG);
    let hashes: Vec<_> =
        parsed.errors().map(|e| extract_signature(&report_id, e).hash).collect();
    assert_eq!(hashes[0], hashes[2], "identical lines must hash identically");
    assert_ne!(hashes[0], hashes[1]);
}
