// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Report intake envelope and its raw telemetry signals.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a bug report.
    ///
    /// Minted by the intake API; every bus payload that fans work out across
    /// the pipeline carries one.
    pub struct ReportId;
}

crate::define_id! {
    /// Unique identifier for one uploaded telemetry artifact.
    pub struct SignalId;
}

/// Kind tag of a raw telemetry artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Screenshot,
    Video,
    Har,
    Log,
}

crate::simple_display! {
    SignalKind {
        Screenshot => "screenshot",
        Video => "video",
        Har => "har",
        Log => "log",
    }
}

impl SignalKind {
    /// Parse the kind tag stored in the `signals.kind` column.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "screenshot" => Some(Self::Screenshot),
            "video" => Some(Self::Video),
            "har" => Some(Self::Har),
            "log" => Some(Self::Log),
            _ => None,
        }
    }
}

/// Intake envelope for one bug.
///
/// The description grows monotonically: extractors append namespaced frames,
/// nothing ever rewrites what intake recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub description: String,
}

/// One raw artifact attached to a report. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    pub report_id: ReportId,
    pub kind: SignalKind,
    /// Object-store key of the raw bytes (`signals/<signal_id>/<filename>`).
    pub s3_key: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

/// Frame header used when extracted text is appended to a report description.
///
/// The signal id in the header is what makes re-ingestion convergent: readers
/// treat the description as a set of frames keyed by id.
pub fn signal_frame(signal_id: &SignalId, text: &str) -> String {
    format!("--- Signal {} ---\n{}", signal_id, text)
}

/// Header line for a signal frame, used to detect frames already present.
pub fn signal_frame_header(signal_id: &SignalId) -> String {
    format!("--- Signal {} ---", signal_id)
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
