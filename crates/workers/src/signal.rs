// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal worker: parse structured signals and cluster the error signatures.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use retrace_core::{ClusterParams, ErrorSignature, ReportId, Signal, SignalKind};
use retrace_runtime::{Handler, WorkerContext, WorkerError};
use retrace_signals::{
    cluster_signatures, embed_checked, extract_signature, parse_har, parse_log, Embed,
};
use retrace_storage::{reports, signatures};
use retrace_wire::{decode, ReportRequest, Subject};

/// Clustering knobs, from the environment.
#[derive(Debug, Clone, Copy)]
pub struct SignalOptions {
    pub similarity_threshold: f64,
    pub min_samples_cluster: usize,
}

impl SignalOptions {
    pub fn load() -> Self {
        Self {
            similarity_threshold: env_parse("SIMILARITY_THRESHOLD", 0.3),
            min_samples_cluster: env_parse("MIN_SAMPLES_CLUSTER", 2),
        }
    }

    pub fn cluster_params(&self) -> ClusterParams {
        ClusterParams { eps: self.similarity_threshold, min_samples: self.min_samples_cluster }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Parse one signal's bytes into signature candidates. HAR signals contribute
/// structure but no signatures; unsupported kinds contribute nothing.
pub fn signatures_from_signal(
    report_id: &ReportId,
    kind: SignalKind,
    bytes: &[u8],
) -> Vec<ErrorSignature> {
    match kind {
        SignalKind::Log => {
            let parsed = parse_log(&String::from_utf8_lossy(bytes));
            parsed.errors().map(|entry| extract_signature(report_id, entry)).collect()
        }
        SignalKind::Har => {
            match parse_har(bytes) {
                Ok(doc) => info!(
                    requests = doc.summary.total_requests,
                    failed = doc.summary.failed_requests,
                    "parsed HAR signal"
                ),
                Err(err) => warn!(error = %err, "HAR parse failed"),
            }
            Vec::new()
        }
        SignalKind::Screenshot | SignalKind::Video => Vec::new(),
    }
}

pub struct SignalHandler {
    ctx: Arc<WorkerContext>,
    embedder: Arc<dyn Embed>,
    options: SignalOptions,
}

impl SignalHandler {
    pub fn new(ctx: Arc<WorkerContext>, embedder: Arc<dyn Embed>, options: SignalOptions) -> Self {
        Self { ctx, embedder, options }
    }

    async fn collect_signatures(
        &self,
        report_id: &ReportId,
        signals: &[Signal],
    ) -> Result<Vec<ErrorSignature>, WorkerError> {
        let mut all = Vec::new();
        for signal in signals {
            let bytes = match self.ctx.objects.get_bytes(&signal.s3_key).await {
                Ok(bytes) => bytes,
                Err(retrace_storage::StorageError::ObjectMissing(key)) => {
                    warn!(signal_id = %signal.id, key, "signal artifact missing, skipping");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            all.extend(signatures_from_signal(report_id, signal.kind, &bytes));
        }
        Ok(all)
    }
}

#[async_trait]
impl Handler for SignalHandler {
    fn role(&self) -> &'static str {
        "signal"
    }

    fn subject(&self) -> Subject {
        Subject::ReportSignals
    }

    async fn handle(&self, payload: &[u8]) -> Result<(), WorkerError> {
        let request: ReportRequest = decode(payload)?;
        let report_id = request.report_id;

        let signals = reports::fetch_signals(&self.ctx.db, &report_id).await?;
        let candidates = self.collect_signatures(&report_id, &signals).await?;
        if candidates.is_empty() {
            info!(report_id = %report_id, "no error signatures found");
            return Ok(());
        }

        let total_input = candidates.len();
        let clustered = cluster_signatures(
            self.embedder.as_ref(),
            candidates,
            self.options.cluster_params(),
        );
        debug_assert_eq!(
            clustered.iter().map(|s| s.frequency as usize).sum::<usize>(),
            total_input,
            "cluster frequencies must cover every input signature"
        );

        for signature in &clustered {
            let embedding = embed_checked(self.embedder.as_ref(), &signature.embedding_text())
                .map_err(|err| WorkerError::Internal(err.to_string()))?;
            signatures::upsert_signature(&self.ctx.db, signature, &embedding).await?;
        }

        info!(
            report_id = %report_id,
            input = total_input,
            clusters = clustered.len(),
            "signatures clustered and persisted"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
