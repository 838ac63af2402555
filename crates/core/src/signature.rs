// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deduplicated error fingerprints extracted from logs.

use crate::report::ReportId;
use serde::{Deserialize, Serialize};

/// Content hash identifying one signature row (MD5 of `message + " " + details`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureHash(pub String);

impl SignatureHash {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignatureHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error classification by keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    SyntaxError,
    ReferenceError,
    TypeError,
    NetworkError,
    DatabaseError,
    AuthenticationError,
    TimeoutError,
    GenericError,
}

crate::simple_display! {
    ErrorKind {
        SyntaxError => "SyntaxError",
        ReferenceError => "ReferenceError",
        TypeError => "TypeError",
        NetworkError => "NetworkError",
        DatabaseError => "DatabaseError",
        AuthenticationError => "AuthenticationError",
        TimeoutError => "TimeoutError",
        GenericError => "GenericError",
    }
}

/// Severity derived from the originating log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

crate::simple_display! {
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// One clustered error fingerprint.
///
/// Invariant: `frequency >= 1`; rows are keyed by `hash` so re-observation
/// increments the count rather than inserting a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSignature {
    pub hash: SignatureHash,
    pub report_id: ReportId,
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<String>,
    pub stack_trace: Option<String>,
    pub key_components: Vec<String>,
    pub severity: Severity,
    pub frequency: u32,
}

impl ErrorSignature {
    /// Text the embedding is computed over: message plus details.
    pub fn embedding_text(&self) -> String {
        match &self.details {
            Some(details) => format!("{} {}", self.message, details),
            None => self.message.clone(),
        }
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
