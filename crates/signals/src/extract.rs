// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest-side text extraction from raw artifacts.
//!
//! Screenshot OCR and video speech-to-text are external collaborators behind
//! [`TextExtract`]; HAR and log extraction are built in. Each extract is
//! truncated and framed per signal before being appended to the report
//! description.

use thiserror::Error;

use crate::har::parse_har_file;

/// Tokens that mark a log line as relevant for ingest extraction.
const SEVERITY_TOKENS: [&str; 8] =
    ["Error", "Exception", "Failed", "Traceback", "ERROR", "WARN", "WARNING", "FATAL"];

/// Cap on matched log lines, and on the no-match prefix fallback.
const MAX_LOG_LINES: usize = 50;
const FALLBACK_PREFIX_CHARS: usize = 1000;

/// Cap applied to every extract before framing.
pub const MAX_EXTRACT_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extractor failed: {0}")]
    Failed(String),
}

/// Opaque `bytes -> text` transform (OCR on a normalized RGB raster, ASR over
/// mono 16 kHz PCM audio). A failing transform yields an empty extract at the
/// call site, never a failed message.
pub trait TextExtract: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// Extractor that is simply not installed. Ingest logs the miss and
/// substitutes an empty extract.
#[derive(Clone, Copy, Default)]
pub struct UnavailableExtract;

impl TextExtract for UnavailableExtract {
    fn extract(&self, _bytes: &[u8]) -> Result<String, ExtractError> {
        Err(ExtractError::Failed("extractor not configured".to_string()))
    }
}

/// HAR ingest text: URL, selected request headers, response status and MIME
/// per entry.
pub fn har_text(bytes: &[u8]) -> String {
    let Ok(file) = parse_har_file(bytes) else {
        return String::new();
    };

    let mut lines: Vec<String> = Vec::new();
    for entry in &file.log.entries {
        if !entry.request.url.is_empty() {
            lines.push(format!("URL: {}", entry.request.url));
        }
        for header in &entry.request.headers {
            if matches!(header.name.to_lowercase().as_str(), "user-agent" | "referer" | "host") {
                lines.push(format!("Header {}: {}", header.name, header.value));
            }
        }
        if entry.response.status != 0 {
            lines.push(format!("Response Status: {}", entry.response.status));
        }
        if !entry.response.content.mime_type.is_empty() {
            lines.push(format!("Content-Type: {}", entry.response.content.mime_type));
        }
    }
    lines.join("\n")
}

/// Log ingest text: lines containing any severity token, capped at 50; when
/// nothing matches, the first 1000 characters.
pub fn log_text(content: &str) -> String {
    let relevant: Vec<&str> = content
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            SEVERITY_TOKENS.iter().any(|t| lower.contains(&t.to_lowercase()))
        })
        .map(str::trim)
        .take(MAX_LOG_LINES)
        .collect();

    if relevant.is_empty() {
        return truncate_chars(content, FALLBACK_PREFIX_CHARS).to_string();
    }
    relevant.join("\n")
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
