// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object-store and cache key layout.
//!
//! Key shapes are the public contract between workers; nothing else may
//! construct them inline.

use retrace_core::{ExportId, ReportId, ReproId, SignalId};

/// `signals/<signal_id>/<filename>` — raw uploaded artifacts.
pub fn signal_key(signal_id: &SignalId, filename: &str) -> String {
    format!("signals/{}/{}", signal_id, filename)
}

/// `shaped-data/<report_id>/fixtures.json` — shaper output.
pub fn shaped_data_key(report_id: &ReportId) -> String {
    format!("shaped-data/{}/fixtures.json", report_id)
}

/// `tests/generated/<repro_id>/<filename>` — synth output.
pub fn generated_test_key(repro_id: &ReproId, filename: &str) -> String {
    format!("tests/generated/{}/{}", repro_id, filename)
}

/// `validation/videos/<repro_id>/<run_id>.webm`
pub fn validation_video_key(repro_id: &ReproId, run_id: &str) -> String {
    format!("validation/videos/{}/{}.webm", repro_id, run_id)
}

/// `validation/traces/<repro_id>/<run_id>.zip`
pub fn validation_trace_key(repro_id: &ReproId, run_id: &str) -> String {
    format!("validation/traces/{}/{}.zip", repro_id, run_id)
}

/// `export/<repro_id>/<export_id>.<ext>`
pub fn export_key(repro_id: &ReproId, export_id: &ExportId, ext: &str) -> String {
    format!("export/{}/{}.{}", repro_id, export_id, ext)
}

/// `resource_stats:<test_id>` — envelope monitor samples (TTL 300 s).
pub fn resource_stats_key(test_id: &str) -> String {
    format!("resource_stats:{}", test_id)
}

/// `test_result:<test_id>` — determinism execution reports (TTL 3600 s).
pub fn test_result_key(test_id: &str) -> String {
    format!("test_result:{}", test_id)
}

/// `stability:<repro_id>` — validation summaries (TTL 86400 s).
pub fn stability_key(repro_id: &ReproId) -> String {
    format!("stability:{}", repro_id)
}

/// Cache TTLs, in seconds.
pub mod ttl {
    pub const RESOURCE_STATS: u64 = 300;
    pub const TEST_RESULT: u64 = 3600;
    pub const STABILITY: u64 = 86_400;
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;
