// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest worker: extract text from every signal of a report and append the
//! namespaced frames to the report description.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use retrace_core::{signal_frame, Signal, SignalId, SignalKind};
use retrace_runtime::{Handler, WorkerContext, WorkerError};
use retrace_signals::{har_text, log_text, truncate_chars, TextExtract, MAX_EXTRACT_CHARS};
use retrace_storage::reports;
use retrace_wire::{decode, ReportRequest, Subject};

/// Opaque extractors the ingest role is deployed with.
pub struct IngestExtractors {
    /// OCR over a normalized RGB raster.
    pub ocr: Arc<dyn TextExtract>,
    /// Speech-to-text over mono 16 kHz PCM audio.
    pub asr: Arc<dyn TextExtract>,
}

/// Dispatch one signal's bytes to the extractor for its kind.
///
/// A failing extractor produces the empty string and a warning; it never
/// fails the message.
pub fn extract_text(extractors: &IngestExtractors, kind: SignalKind, bytes: &[u8]) -> String {
    let run_opaque = |extractor: &Arc<dyn TextExtract>| match extractor.extract(bytes) {
        Ok(text) => text.trim().to_string(),
        Err(err) => {
            warn!(kind = %kind, error = %err, "extractor failed, substituting empty text");
            String::new()
        }
    };

    match kind {
        SignalKind::Screenshot => run_opaque(&extractors.ocr),
        SignalKind::Video => run_opaque(&extractors.asr),
        SignalKind::Har => har_text(bytes),
        SignalKind::Log => log_text(&String::from_utf8_lossy(bytes)),
    }
}

/// Frame the non-empty extracts in signal-enumeration order, truncating each
/// to the extract cap.
pub fn assemble_frames(
    signals: &[Signal],
    extracts: &[String],
) -> Vec<(SignalId, String)> {
    signals
        .iter()
        .zip(extracts)
        .filter(|(_, text)| !text.is_empty())
        .map(|(signal, text)| {
            let truncated = truncate_chars(text, MAX_EXTRACT_CHARS);
            (signal.id.clone(), signal_frame(&signal.id, truncated))
        })
        .collect()
}

pub struct IngestHandler {
    ctx: Arc<WorkerContext>,
    extractors: Arc<IngestExtractors>,
}

impl IngestHandler {
    pub fn new(ctx: Arc<WorkerContext>, extractors: IngestExtractors) -> Self {
        Self { ctx, extractors: Arc::new(extractors) }
    }

    async fn extract_one(&self, signal: &Signal) -> Result<String, WorkerError> {
        let bytes = match self.ctx.objects.get_bytes(&signal.s3_key).await {
            Ok(bytes) => bytes,
            Err(retrace_storage::StorageError::ObjectMissing(key)) => {
                warn!(signal_id = %signal.id, key, "signal artifact missing, skipping");
                return Ok(String::new());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(extract_text(&self.extractors, signal.kind, &bytes))
    }
}

#[async_trait]
impl Handler for IngestHandler {
    fn role(&self) -> &'static str {
        "ingest"
    }

    fn subject(&self) -> Subject {
        Subject::ReportIngest
    }

    async fn handle(&self, payload: &[u8]) -> Result<(), WorkerError> {
        let request: ReportRequest = decode(payload)?;
        let report_id = request.report_id;

        let signals = reports::fetch_signals(&self.ctx.db, &report_id).await?;
        if signals.is_empty() {
            info!(report_id = %report_id, "no signals to ingest");
            return Ok(());
        }

        // Extract concurrently, capped by the admission setting; frame order
        // follows signal enumeration order regardless of completion order.
        let semaphore = Arc::new(Semaphore::new(self.ctx.config.max_concurrent_tasks.max(1)));
        let mut tasks = Vec::with_capacity(signals.len());
        for signal in &signals {
            let semaphore = Arc::clone(&semaphore);
            tasks.push(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| WorkerError::Internal("semaphore closed".into()))?;
                self.extract_one(signal).await
            });
        }
        let results = futures_util::future::join_all(tasks).await;
        let extracts: Vec<String> = results.into_iter().collect::<Result<_, _>>()?;

        let frames = assemble_frames(&signals, &extracts);
        if frames.is_empty() {
            info!(report_id = %report_id, "no text extracted");
            return Ok(());
        }

        let appended =
            reports::append_description_frames(&self.ctx.db, &report_id, &frames).await?;
        info!(
            report_id = %report_id,
            signals = signals.len(),
            frames = frames.len(),
            appended,
            "ingest completed"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
