// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Export deliveries and CLI reproduction ecosystems.

use serde::{Deserialize, Serialize};

use crate::repro::ReproId;

crate::define_id! {
    /// Unique identifier for one export delivery.
    pub struct ExportId;
}

/// Delivery channel for a validated repro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportType {
    Pr,
    Sandbox,
    Docker,
    Report,
}

crate::simple_display! {
    ExportType {
        Pr => "pr",
        Sandbox => "sandbox",
        Docker => "docker",
        Report => "report",
    }
}

impl ExportType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pr" => Some(Self::Pr),
            "sandbox" => Some(Self::Sandbox),
            "docker" => Some(Self::Docker),
            "report" => Some(Self::Report),
            _ => None,
        }
    }
}

/// Status of one export delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Completed,
    Failed,
}

crate::simple_display! {
    ExportStatus {
        Completed => "completed",
        Failed => "failed",
    }
}

/// Outcome of one delivery request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    pub id: ExportId,
    pub repro_id: ReproId,
    pub export_type: ExportType,
    /// Opaque result blob: PR url, sandbox url, tarball key, report key.
    pub result: serde_json::Value,
    pub status: ExportStatus,
}

/// Build ecosystem for a CLI reproduction tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CliEcosystem {
    JvmMaven,
    JvmGradle,
    Go,
}

crate::simple_display! {
    CliEcosystem {
        JvmMaven => "jvm-maven",
        JvmGradle => "jvm-gradle",
        Go => "go",
    }
}

impl CliEcosystem {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "jvm-maven" | "maven" => Some(Self::JvmMaven),
            "jvm-gradle" | "gradle" => Some(Self::JvmGradle),
            "go" => Some(Self::Go),
            _ => None,
        }
    }

    pub fn build_command(&self) -> &'static str {
        match self {
            Self::JvmMaven => "mvn test",
            Self::JvmGradle => "./gradlew test",
            Self::Go => "go test -v",
        }
    }
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
