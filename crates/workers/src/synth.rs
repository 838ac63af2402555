// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synth worker: derive an executable scenario from a report's HAR signals
//! and persist it as a repro with ordered steps.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use retrace_core::{Repro, ReproId, ReproStatus, SignalKind};
use retrace_runtime::{Handler, WorkerContext, WorkerError};
use retrace_signals::har::parse_har_file;
use retrace_storage::{keys, reports, repros};
use retrace_synth::{build_steps, extract_interactions, generate_artifacts, Interactions};
use retrace_wire::{decode, ReportRequest, Subject};

/// Stable repro id derived from the report: redelivered synth messages mint
/// the same id and the insert converges.
pub fn repro_id_for(report_id: &retrace_core::ReportId) -> ReproId {
    ReproId::new(format!("repro-{}", report_id))
}

/// Title for the generated test, from the first description line.
pub fn title_from_description(description: &str) -> String {
    let first_line = description.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let title = first_line.trim();
    if title.is_empty() {
        "Generated reproduction".to_string()
    } else {
        retrace_core::short(title, 120).to_string()
    }
}

pub struct SynthHandler {
    ctx: Arc<WorkerContext>,
}

impl SynthHandler {
    pub fn new(ctx: Arc<WorkerContext>) -> Self {
        Self { ctx }
    }

    /// Merge interactions across every HAR signal of the report.
    async fn collect_interactions(
        &self,
        signals: &[retrace_core::Signal],
    ) -> Result<Interactions, WorkerError> {
        let mut merged = Interactions::default();
        for signal in signals {
            if signal.kind != SignalKind::Har {
                continue;
            }
            let bytes = match self.ctx.objects.get_bytes(&signal.s3_key).await {
                Ok(bytes) => bytes,
                Err(retrace_storage::StorageError::ObjectMissing(key)) => {
                    warn!(signal_id = %signal.id, key, "HAR artifact missing, skipping");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            match parse_har_file(&bytes) {
                Ok(har) => {
                    let interactions = extract_interactions(&har);
                    merged.navigation.extend(interactions.navigation);
                    merged.form_submissions.extend(interactions.form_submissions);
                    merged.api_calls.extend(interactions.api_calls);
                }
                Err(err) => {
                    warn!(signal_id = %signal.id, error = %err, "HAR parse failed, skipping");
                }
            }
        }
        Ok(merged)
    }
}

#[async_trait]
impl Handler for SynthHandler {
    fn role(&self) -> &'static str {
        "synth"
    }

    fn subject(&self) -> Subject {
        Subject::ReportSynth
    }

    async fn handle(&self, payload: &[u8]) -> Result<(), WorkerError> {
        let request: ReportRequest = decode(payload)?;
        let report_id = request.report_id;

        let report = reports::fetch_report(&self.ctx.db, &report_id).await?;
        let signals = reports::fetch_signals(&self.ctx.db, &report_id).await?;
        if signals.is_empty() {
            info!(report_id = %report_id, "no signals available for synthesis");
            return Ok(());
        }

        let interactions = self.collect_interactions(&signals).await?;
        let repro_id = repro_id_for(&report_id);
        let steps = build_steps(&repro_id, &interactions);
        let title = title_from_description(&report.description);
        let artifacts = generate_artifacts(&title, &interactions, &steps);

        for (filename, content) in artifacts.files() {
            let key = keys::generated_test_key(&repro_id, filename);
            self.ctx.objects.put_bytes(&key, content.into_bytes()).await?;
        }

        let compose_json = serde_yaml::from_value::<serde_json::Value>(artifacts.compose.clone())
            .unwrap_or(serde_json::Value::Null);
        let repro = Repro {
            id: repro_id.clone(),
            report_id: report_id.clone(),
            framework: "playwright".to_string(),
            entry: retrace_synth::script::ENTRY_FILE.to_string(),
            docker_compose: compose_json,
            seed: artifacts.fixtures.clone(),
            status: ReproStatus::Created,
            title: Some(title),
            description: Some(report.description.clone()),
        };
        repros::insert_repro_with_steps(&self.ctx.db, &repro, &steps).await?;

        info!(
            report_id = %report_id,
            repro_id = %repro_id,
            interactions = interactions.total(),
            steps = steps.len(),
            "synthesis completed"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "synth_tests.rs"]
mod tests;
