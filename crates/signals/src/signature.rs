// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error signature extraction from parsed log entries.

use md5::{Digest, Md5};
use regex::Regex;
use std::sync::LazyLock;

use retrace_core::{ErrorKind, ErrorSignature, ReportId, Severity, SignatureHash};

use crate::logparse::LogEntry;

// Static patterns; exercised by the extraction tests.
#[allow(clippy::unwrap_used)]
static STACK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?im)at\s+[^\n]+\n(?:\s+at\s+[^\n]+\n?)+",
        r"(?im)Traceback\s*\([^)]*\):\s*\n(?:\s+[^\n]+\n?)+",
        r"(?im)Stack\s+trace:\s*\n(?:\s+[^\n]+\n?)+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

#[allow(clippy::unwrap_used)]
static DOUBLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]*)""#).unwrap());
#[allow(clippy::unwrap_used)]
static SINGLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'([^']*)'").unwrap());
#[allow(clippy::unwrap_used)]
static FILE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[^\s]+\.[a-zA-Z]{2,4}").unwrap());
#[allow(clippy::unwrap_used)]
static CALLABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z_][a-zA-Z0-9_]*\([^)]*\)").unwrap());
#[allow(clippy::unwrap_used)]
static NUMERIC_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{3,4}\b").unwrap());

/// Classify the error by keyword over message + details.
pub fn classify_error(text: &str) -> ErrorKind {
    let lower = text.to_lowercase();
    if lower.contains("syntaxerror") || lower.contains("syntax error") {
        ErrorKind::SyntaxError
    } else if lower.contains("referenceerror") || lower.contains("reference error") {
        ErrorKind::ReferenceError
    } else if lower.contains("typeerror") || lower.contains("type error") {
        ErrorKind::TypeError
    } else if lower.contains("network") || lower.contains("connection") {
        ErrorKind::NetworkError
    } else if lower.contains("database") || lower.contains("sql") {
        ErrorKind::DatabaseError
    } else if lower.contains("authentication") || lower.contains("unauthorized") {
        ErrorKind::AuthenticationError
    } else if lower.contains("timeout") {
        ErrorKind::TimeoutError
    } else {
        ErrorKind::GenericError
    }
}

/// First match of the common stack-trace shapes, if any.
pub fn extract_stack_trace(text: &str) -> Option<String> {
    STACK_PATTERNS
        .iter()
        .find_map(|p| p.find(text))
        .map(|m| m.as_str().trim().to_string())
}

/// Deduplicated union of quoted strings, path-like tokens, callable names and
/// 3-4 digit numeric codes.
pub fn extract_key_components(text: &str) -> Vec<String> {
    let mut components: Vec<String> = Vec::new();
    let mut push = |s: String| {
        if !s.is_empty() && !components.contains(&s) {
            components.push(s);
        }
    };

    for caps in DOUBLE_QUOTED.captures_iter(text) {
        push(caps[1].to_string());
    }
    for caps in SINGLE_QUOTED.captures_iter(text) {
        push(caps[1].to_string());
    }
    for m in FILE_PATH.find_iter(text) {
        push(m.as_str().to_string());
    }
    for m in CALLABLE.find_iter(text) {
        push(m.as_str().to_string());
    }
    for m in NUMERIC_CODE.find_iter(text) {
        push(m.as_str().to_string());
    }

    components
}

/// Severity from the originating log level.
pub fn severity_for(entry: &LogEntry) -> Severity {
    if entry.level.is_error() {
        Severity::High
    } else if entry.level.is_warning() {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// MD5 content hash of `message + " " + details`.
pub fn signature_hash(message: &str, details: Option<&str>) -> SignatureHash {
    let full_text = full_text(message, details);
    let digest = Md5::digest(full_text.as_bytes());
    SignatureHash::new(format!("{:x}", digest))
}

fn full_text(message: &str, details: Option<&str>) -> String {
    match details {
        Some(details) => format!("{} {}", message, details),
        None => message.to_string(),
    }
}

/// Build one signature candidate from an ERROR log entry.
pub fn extract_signature(report_id: &ReportId, entry: &LogEntry) -> ErrorSignature {
    let text = full_text(&entry.message, entry.details.as_deref());
    ErrorSignature {
        hash: signature_hash(&entry.message, entry.details.as_deref()),
        report_id: report_id.clone(),
        kind: classify_error(&text),
        message: entry.message.clone(),
        details: entry.details.clone(),
        stack_trace: extract_stack_trace(&text),
        key_components: extract_key_components(&text),
        severity: severity_for(entry),
        frequency: 1,
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
