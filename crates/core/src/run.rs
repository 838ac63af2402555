// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable records of individual repro executions.

use serde::{Deserialize, Serialize};

use crate::repro::ReproId;

/// One execution of a repro. Immutable after creation.
///
/// Keyed by `(repro_id, iteration)` so bus redelivery cannot create duplicate
/// rows for the same run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub repro_id: ReproId,
    pub iteration: u32,
    pub passed: bool,
    pub duration_ms: u64,
    pub exit_code: i32,
    pub logs: String,
    pub video_key: Option<String>,
    pub trace_key: Option<String>,
}
