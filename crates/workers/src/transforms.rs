// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque-transform and collaborator seams.
//!
//! Model invocations (PII analysis, PDF rendering) and hosted-API wrappers
//! (git hosts, sandbox builders) are external collaborators; the pipeline
//! only knows these contracts.

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use retrace_runtime::WorkerError;

/// Entity kinds the PII gate checks.
pub const PII_ENTITIES: [&str; 8] = [
    "PERSON",
    "EMAIL_ADDRESS",
    "PHONE_NUMBER",
    "LOCATION",
    "CREDIT_CARD",
    "SSN",
    "DATE_TIME",
    "IP_ADDRESS",
];

/// One detected PII span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PiiEntity {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

/// PII analysis over free text. Detection quality is the collaborator's
/// problem; the shaper only gates on confidence and replaces spans.
pub trait PiiScrub: Send + Sync {
    fn analyze(&self, text: &str) -> Vec<PiiEntity>;
}

/// Pattern-backed analyzer for the entity kinds a regex can carry.
///
/// Covers EMAIL_ADDRESS, PHONE_NUMBER, SSN, CREDIT_CARD and IP_ADDRESS;
/// model-only kinds (PERSON, LOCATION, DATE_TIME) come back empty here and
/// require a real analyzer deployment.
#[derive(Clone, Copy, Default)]
pub struct RegexPiiScrub;

#[allow(clippy::unwrap_used)]
static PII_PATTERNS: LazyLock<Vec<(&'static str, f64, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "EMAIL_ADDRESS",
            0.95,
            Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
        ),
        ("SSN", 0.9, Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap()),
        ("CREDIT_CARD", 0.85, Regex::new(r"\b(?:\d[ -]?){13,16}\b").unwrap()),
        (
            "IP_ADDRESS",
            0.8,
            Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap(),
        ),
        (
            "PHONE_NUMBER",
            0.6,
            Regex::new(r"\+?\d{1,3}[ -]?\(?\d{3}\)?[ -]?\d{3}[ -]?\d{4}").unwrap(),
        ),
    ]
});

impl PiiScrub for RegexPiiScrub {
    fn analyze(&self, text: &str) -> Vec<PiiEntity> {
        let mut out = Vec::new();
        for (entity_type, confidence, pattern) in PII_PATTERNS.iter() {
            for m in pattern.find_iter(text) {
                out.push(PiiEntity {
                    entity_type: entity_type.to_string(),
                    start: m.start(),
                    end: m.end(),
                    confidence: *confidence,
                });
            }
        }
        out.sort_by_key(|e| e.start);
        out
    }
}

/// Replace every entity at or above the confidence threshold with its kind
/// tag. Returns the scrubbed text and the spans that were applied.
pub fn scrub_text(
    analyzer: &dyn PiiScrub,
    text: &str,
    threshold: f64,
) -> (String, Vec<PiiEntity>) {
    let mut entities: Vec<PiiEntity> = analyzer
        .analyze(text)
        .into_iter()
        .filter(|e| e.confidence >= threshold && PII_ENTITIES.contains(&e.entity_type.as_str()))
        .collect();
    entities.sort_by_key(|e| e.start);

    // Drop overlapping spans; the earlier (already kept) span wins.
    let mut kept: Vec<PiiEntity> = Vec::new();
    for entity in entities {
        if kept.last().map_or(true, |prev| entity.start >= prev.end) {
            kept.push(entity);
        }
    }

    let mut scrubbed = String::with_capacity(text.len());
    let mut cursor = 0;
    for entity in &kept {
        if entity.start > text.len() || entity.end > text.len() || entity.start < cursor {
            continue;
        }
        scrubbed.push_str(&text[cursor..entity.start]);
        scrubbed.push('<');
        scrubbed.push_str(&entity.entity_type);
        scrubbed.push('>');
        cursor = entity.end;
    }
    scrubbed.push_str(&text[cursor..]);
    (scrubbed, kept)
}

/// Report data handed to delivery collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct ReproReportData {
    pub repro_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub stability_score: Option<f64>,
    pub test_code: String,
}

/// Opaque PDF rendering transform.
pub trait ReportRender: Send + Sync {
    fn render_pdf(&self, report: &ReproReportData) -> Result<Vec<u8>, WorkerError>;
}

/// Git hosting collaborator: branch + file + pull request.
#[async_trait]
pub trait GitHost: Send + Sync {
    async fn create_branch(&self, repo_url: &str, branch: &str) -> Result<(), WorkerError>;
    async fn commit_file(
        &self,
        repo_url: &str,
        branch: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<(), WorkerError>;
    async fn open_pull_request(
        &self,
        repo_url: &str,
        branch: &str,
        title: &str,
        body: &str,
    ) -> Result<serde_json::Value, WorkerError>;
}

/// Online sandbox collaborator.
#[async_trait]
pub trait SandboxHost: Send + Sync {
    async fn create_sandbox(
        &self,
        title: &str,
        files: &[(String, String)],
    ) -> Result<serde_json::Value, WorkerError>;
}

/// Stand-in for an unconfigured collaborator; every call fails terminally so
/// the export is recorded as failed rather than retried forever.
#[derive(Clone, Copy, Default)]
pub struct Unconfigured(pub &'static str);

#[async_trait]
impl GitHost for Unconfigured {
    async fn create_branch(&self, _repo_url: &str, _branch: &str) -> Result<(), WorkerError> {
        Err(WorkerError::MalformedInput(format!("{} not configured", self.0)))
    }

    async fn commit_file(
        &self,
        _repo_url: &str,
        _branch: &str,
        _path: &str,
        _content: &str,
        _message: &str,
    ) -> Result<(), WorkerError> {
        Err(WorkerError::MalformedInput(format!("{} not configured", self.0)))
    }

    async fn open_pull_request(
        &self,
        _repo_url: &str,
        _branch: &str,
        _title: &str,
        _body: &str,
    ) -> Result<serde_json::Value, WorkerError> {
        Err(WorkerError::MalformedInput(format!("{} not configured", self.0)))
    }
}

#[async_trait]
impl SandboxHost for Unconfigured {
    async fn create_sandbox(
        &self,
        _title: &str,
        _files: &[(String, String)],
    ) -> Result<serde_json::Value, WorkerError> {
        Err(WorkerError::MalformedInput(format!("{} not configured", self.0)))
    }
}

impl ReportRender for Unconfigured {
    fn render_pdf(&self, _report: &ReproReportData) -> Result<Vec<u8>, WorkerError> {
        Err(WorkerError::MalformedInput(format!("{} not configured", self.0)))
    }
}

#[cfg(test)]
#[path = "transforms_tests.rs"]
mod tests;
