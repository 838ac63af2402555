// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus subjects and consumer-group naming.

use serde::{Deserialize, Serialize};

/// Every subject the pipeline consumes or publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    ReportIngest,
    ReportSignals,
    ReportSynth,
    DataShape,
    MappingRequest,
    MappingCompleted,
    DeterminismControl,
    ReproValidate,
    CliRequest,
    CliCompleted,
    ExportRequest,
    ExportCompleted,
}

const ALL: [Subject; 12] = [
    Subject::ReportIngest,
    Subject::ReportSignals,
    Subject::ReportSynth,
    Subject::DataShape,
    Subject::MappingRequest,
    Subject::MappingCompleted,
    Subject::DeterminismControl,
    Subject::ReproValidate,
    Subject::CliRequest,
    Subject::CliCompleted,
    Subject::ExportRequest,
    Subject::ExportCompleted,
];

impl Subject {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Subject::ReportIngest => "report.ingest",
            Subject::ReportSignals => "report.signals",
            Subject::ReportSynth => "report.synth",
            Subject::DataShape => "data.shape",
            Subject::MappingRequest => "mapping.request",
            Subject::MappingCompleted => "mapping.completed",
            Subject::DeterminismControl => "determinism.control",
            Subject::ReproValidate => "repro.validate",
            Subject::CliRequest => "cli.request",
            Subject::CliCompleted => "cli.completed",
            Subject::ExportRequest => "export.request",
            Subject::ExportCompleted => "export.completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        ALL.iter().copied().find(|subject| subject.as_str() == s)
    }

    /// All subjects, for stream provisioning.
    pub fn all() -> &'static [Subject] {
        &ALL
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side subject messages are moved to after exhausting the redelivery budget.
pub fn quarantine_subject(subject: Subject) -> String {
    format!("{}.quarantine", subject.as_str())
}

#[cfg(test)]
#[path = "subject_tests.rs"]
mod tests;
