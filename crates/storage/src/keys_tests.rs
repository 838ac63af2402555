// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn object_store_layout() {
    assert_eq!(signal_key(&SignalId::new("s1"), "shot.png"), "signals/s1/shot.png");
    assert_eq!(shaped_data_key(&ReportId::new("r1")), "shaped-data/r1/fixtures.json");
    assert_eq!(
        generated_test_key(&ReproId::new("rp1"), "test.spec.ts"),
        "tests/generated/rp1/test.spec.ts"
    );
    assert_eq!(
        validation_video_key(&ReproId::new("rp1"), "rp1_run_2"),
        "validation/videos/rp1/rp1_run_2.webm"
    );
    assert_eq!(
        export_key(&ReproId::new("rp1"), &ExportId::new("e1"), "tar.gz"),
        "export/rp1/e1.tar.gz"
    );
}

#[test]
fn cache_keys_and_ttls() {
    assert_eq!(resource_stats_key("t1"), "resource_stats:t1");
    assert_eq!(test_result_key("t1"), "test_result:t1");
    assert_eq!(stability_key(&ReproId::new("rp1")), "stability:rp1");
    assert_eq!(ttl::RESOURCE_STATS, 300);
    assert_eq!(ttl::TEST_RESULT, 3600);
    assert_eq!(ttl::STABILITY, 86_400);
}
