// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use retrace_core::ReportId;
use retrace_signals::{ExtractError, UnavailableExtract};

struct FixedExtract(&'static str);

impl TextExtract for FixedExtract {
    fn extract(&self, _bytes: &[u8]) -> Result<String, ExtractError> {
        Ok(self.0.to_string())
    }
}

fn extractors(ocr: &'static str) -> IngestExtractors {
    IngestExtractors { ocr: Arc::new(FixedExtract(ocr)), asr: Arc::new(UnavailableExtract) }
}

fn signal(id: &str, kind: SignalKind) -> Signal {
    Signal {
        id: SignalId::new(id),
        report_id: ReportId::new("r-1"),
        kind,
        s3_key: format!("signals/{}/file", id),
        meta: serde_json::Value::Null,
    }
}

#[test]
fn screenshot_goes_through_ocr() {
    let text = extract_text(&extractors("login button"), SignalKind::Screenshot, b"png");
    assert_eq!(text, "login button");
}

#[test]
fn failing_extractor_substitutes_empty_text() {
    let text = extract_text(&extractors(""), SignalKind::Video, b"webm");
    assert_eq!(text, "");
}

#[test]
fn log_bytes_use_builtin_extraction() {
    let text = extract_text(&extractors(""), SignalKind::Log, b"ok line\nERROR boom\n");
    assert_eq!(text, "ERROR boom");
}

#[test]
fn frames_skip_empty_extracts_and_keep_order() {
    let signals =
        vec![signal("s1", SignalKind::Log), signal("s2", SignalKind::Video), signal("s3", SignalKind::Log)];
    let extracts = vec!["first".to_string(), String::new(), "third".to_string()];

    let frames = assemble_frames(&signals, &extracts);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].0, "s1");
    assert_eq!(frames[0].1, "--- Signal s1 ---\nfirst");
    assert_eq!(frames[1].0, "s3");
}

#[test]
fn frames_truncate_to_extract_cap() {
    let signals = vec![signal("s1", SignalKind::Log)];
    let extracts = vec!["x".repeat(5000)];
    let frames = assemble_frames(&signals, &extracts);
    let body = frames[0].1.strip_prefix("--- Signal s1 ---\n").unwrap();
    assert_eq!(body.len(), 2000);
}

#[test]
fn empty_signal_set_yields_no_frames() {
    assert!(assemble_frames(&[], &[]).is_empty());
}
