// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload DTOs for every bus subject.

use serde::{Deserialize, Serialize};

use retrace_core::{ExportId, ExportType, ReportId, ReproId};

use crate::determinism::{TestConfig, ValidationConfig};

/// Fan-out payload shared by `report.ingest`, `report.signals`, `report.synth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub report_id: ReportId,
}

/// `data.shape` options block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataShapeOptions {
    #[serde(default = "default_context")]
    pub context: String,
    #[serde(default = "default_record_count")]
    pub record_count: u32,
}

impl Default for DataShapeOptions {
    fn default() -> Self {
        Self { context: default_context(), record_count: default_record_count() }
    }
}

/// `data.shape` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataShapeRequest {
    pub report_id: ReportId,
    #[serde(default)]
    pub options: DataShapeOptions,
}

/// `mapping.request` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRequest {
    pub mapping_id: String,
    pub project_id: String,
    pub report_id: ReportId,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub repo_path: Option<String>,
}

/// `mapping.completed` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingCompleted {
    pub mapping_id: String,
    pub report_id: ReportId,
    pub framework_scores: serde_json::Value,
    pub module_suggestions: serde_json::Value,
    pub doc_results: serde_json::Value,
}

/// `determinism.control` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeterminismRequest {
    pub test_config: TestConfig,
}

/// `repro.validate` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub validation_config: ValidationConfig,
}

/// `cli.request` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliRequest {
    pub repro_id: ReproId,
    pub test_code: String,
    /// Ecosystem tag or `auto` to detect from `repo_path`.
    #[serde(default = "default_ecosystem")]
    pub ecosystem: String,
    #[serde(default)]
    pub repo_path: Option<String>,
}

/// `cli.completed` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliCompleted {
    pub cli_repro_id: String,
    pub repro_id: ReproId,
    pub ecosystem: String,
    pub result: serde_json::Value,
}

/// `export.request` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub repro_id: ReproId,
    pub export_type: ExportType,
    #[serde(default)]
    pub options: serde_json::Value,
}

/// `export.completed` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportCompleted {
    pub export_id: ExportId,
    pub repro_id: ReproId,
    pub export_type: ExportType,
    pub result: serde_json::Value,
}

fn default_context() -> String {
    "web".to_string()
}

fn default_record_count() -> u32 {
    10
}

fn default_ecosystem() -> String {
    "auto".to_string()
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
