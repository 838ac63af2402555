// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured log parsing.
//!
//! Line shape: `<timestamp> [<logger>]? <LEVEL> <message>(: <details>)?`,
//! matched case-insensitively anywhere in the line. Lines that don't match
//! are skipped; only ERROR lines become signature candidates.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

// Static pattern; the parse tests exercise it.
#[allow(clippy::unwrap_used)]
static LOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d{4}-\d{2}-\d{2}[T\s]\d{2}:\d{2}:\d{2}(?:\.\d{3})?Z?)\s*(?:\[([^\]]+)\])?\s*(ERROR|WARN|WARNING|INFO|DEBUG)\s*(.*?)(?:\s*:\s*(.*))?$",
    )
    .unwrap()
});

/// Log level tag recognised by the line regex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Error,
    Warn,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ERROR" => Some(Self::Error),
            "WARN" => Some(Self::Warn),
            "WARNING" => Some(Self::Warning),
            "INFO" => Some(Self::Info),
            "DEBUG" => Some(Self::Debug),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warn | Self::Warning)
    }
}

/// One parsed log line.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub line_number: usize,
    pub timestamp: String,
    pub logger: Option<String>,
    pub level: LogLevel,
    pub message: String,
    pub details: Option<String>,
}

/// Per-level line counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogSummary {
    pub total_lines: usize,
    pub error_lines: usize,
    pub warning_lines: usize,
    pub info_lines: usize,
}

/// A fully parsed log file.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedLog {
    pub entries: Vec<LogEntry>,
    pub summary: LogSummary,
}

impl ParsedLog {
    /// ERROR entries, in file order.
    pub fn errors(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| e.level.is_error())
    }
}

/// Parse log text into structured entries and level counts.
pub fn parse_log(content: &str) -> ParsedLog {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut summary = LogSummary { total_lines: lines.len(), ..Default::default() };
    let mut entries = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(caps) = LOG_LINE.captures(line) else {
            continue;
        };
        let Some(level) = caps.get(3).and_then(|m| LogLevel::parse(m.as_str())) else {
            continue;
        };

        if level.is_error() {
            summary.error_lines += 1;
        } else if level.is_warning() {
            summary.warning_lines += 1;
        } else if level == LogLevel::Info {
            summary.info_lines += 1;
        }

        entries.push(LogEntry {
            line_number: i + 1,
            timestamp: caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
            logger: caps.get(2).map(|m| m.as_str().to_string()),
            level,
            message: caps.get(4).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
            details: caps
                .get(5)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty()),
        });
    }

    ParsedLog { entries, summary }
}

#[cfg(test)]
#[path = "logparse_tests.rs"]
mod tests;
