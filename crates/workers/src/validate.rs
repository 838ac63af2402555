// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validate worker: the N-run validation loop with stability scoring and
//! delta minimization.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use retrace_core::{stability_metrics, Repro, ReproId, ReproStatus, RunRecord, Step};
use retrace_envelope::EnvelopeExecutor;
use retrace_runtime::{Handler, TempScope, WorkerContext, WorkerError};
use retrace_storage::{keys, repros, StorageError};
use retrace_synth::{generate_artifacts, Interactions};
use retrace_wire::{decode, DeterminismConfig, Subject, TestConfig, ValidateRequest};

use crate::minimize::{ddmin, MinimizeOutcome, StepProbe};

/// Validation knobs, from the environment.
#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions {
    pub min_runs: u32,
    pub max_runs: u32,
    pub max_concurrent_runs: usize,
    pub flaky_threshold: f64,
    pub enable_minimization: bool,
    pub minimization_timeout: Duration,
    pub video_recording: bool,
    pub trace_recording: bool,
}

impl ValidateOptions {
    pub fn load() -> Self {
        Self {
            min_runs: env_parse("MIN_RUNS", 5),
            max_runs: env_parse("MAX_RUNS", 20),
            max_concurrent_runs: env_parse("MAX_CONCURRENT_RUNS", 3),
            flaky_threshold: env_parse("FLAKY_THRESHOLD", 0.3),
            enable_minimization: env_parse("ENABLE_MINIMIZATION", true),
            minimization_timeout: Duration::from_secs(env_parse("MINIMIZATION_TIMEOUT", 300)),
            video_recording: env_parse("VIDEO_RECORDING", true),
            trace_recording: env_parse("TRACE_RECORDING", true),
        }
    }

    /// Clamp the requested run count into `[min_runs, max_runs]`.
    pub fn clamp_runs(&self, requested: u32) -> u32 {
        requested.clamp(self.min_runs, self.max_runs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Stable run id: replays of the same iteration overwrite the same artifact
/// keys instead of accumulating new ones.
pub fn run_id(repro_id: &ReproId, iteration: u32) -> String {
    format!("{}_run_{}", repro_id, iteration)
}

/// Whether minimization should run: flaky beyond the threshold and at least
/// one failure to preserve.
pub fn should_minimize(flaky_score: f64, failed_runs: usize, threshold: f64) -> bool {
    flaky_score > threshold && failed_runs > 0
}

/// Output of one staged run execution.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub passed: bool,
    pub duration_ms: u64,
    pub exit_code: i32,
    pub logs: String,
    pub video: Option<PathBuf>,
    pub trace: Option<PathBuf>,
}

/// Executes one staged repro run. Production wraps the determinism envelope;
/// tests substitute scripted outcomes.
#[async_trait]
pub trait RunExecutor: Send + Sync {
    async fn execute(
        &self,
        staged_dir: &Path,
        run_id: &str,
        determinism: &DeterminismConfig,
    ) -> Result<RunOutput, WorkerError>;
}

/// Envelope-backed run executor.
pub struct EnvelopeRunExecutor {
    executor: Arc<EnvelopeExecutor>,
    base_image: String,
    test_command: String,
}

impl EnvelopeRunExecutor {
    pub fn new(executor: Arc<EnvelopeExecutor>) -> Self {
        Self {
            executor,
            base_image: std::env::var("VALIDATE_IMAGE")
                .unwrap_or_else(|_| "mcr.microsoft.com/playwright:v1.40.0".to_string()),
            test_command: std::env::var("VALIDATE_COMMAND")
                .unwrap_or_else(|_| "npx playwright test test.spec.ts".to_string()),
        }
    }
}

#[async_trait]
impl RunExecutor for EnvelopeRunExecutor {
    async fn execute(
        &self,
        staged_dir: &Path,
        run_id: &str,
        determinism: &DeterminismConfig,
    ) -> Result<RunOutput, WorkerError> {
        let mut config = TestConfig::new(run_id);
        config.base_image = self.base_image.clone();
        config.test_command = self.test_command.clone();
        config.determinism = determinism.clone();
        config.mount_dir = Some(staged_dir.to_string_lossy().into_owned());

        let started = tokio::time::Instant::now();
        let report = self.executor.execute(&config).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let outcome = report.test_result.as_ref();
        let exists = |name: &str| {
            let path = staged_dir.join(name);
            path.exists().then_some(path)
        };
        Ok(RunOutput {
            passed: report.passed(),
            duration_ms,
            exit_code: outcome.map(|o| o.exit_code).unwrap_or(-1),
            logs: outcome
                .map(|o| o.output.clone())
                .unwrap_or_else(|| report.errors.join("\n")),
            video: exists("video.webm"),
            trace: exists("trace.zip"),
        })
    }
}

pub struct ValidateHandler {
    ctx: Arc<WorkerContext>,
    executor: Arc<dyn RunExecutor>,
    options: ValidateOptions,
}

impl ValidateHandler {
    pub fn new(
        ctx: Arc<WorkerContext>,
        executor: Arc<dyn RunExecutor>,
        options: ValidateOptions,
    ) -> Self {
        Self { ctx, executor, options }
    }

    /// Fetch and stage the generated artifact set into a per-run directory.
    /// Missing artifacts are tolerated so partial syntheses still validate.
    async fn stage_artifacts(&self, repro: &Repro, run_dir: &Path) -> Result<(), WorkerError> {
        for filename in ["test.spec.ts", "fixtures.json", "docker-compose.yml"] {
            let key = keys::generated_test_key(&repro.id, filename);
            match self.ctx.objects.get_to_file(&key, &run_dir.join(filename)).await {
                Ok(()) => {}
                Err(StorageError::ObjectMissing(key)) => {
                    warn!(key, "generated artifact missing, staging without it");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    async fn execute_one_run(
        &self,
        repro: &Repro,
        scope: &TempScope,
        iteration: u32,
        determinism: &DeterminismConfig,
    ) -> Result<RunRecord, WorkerError> {
        let run_dir = scope
            .subdir(&format!("run_{}", iteration))
            .map_err(|err| WorkerError::Internal(err.to_string()))?;
        self.stage_artifacts(repro, &run_dir).await?;

        let run_id = run_id(&repro.id, iteration);
        let output = self.executor.execute(&run_dir, &run_id, determinism).await?;

        let video_key = match (&output.video, self.options.video_recording) {
            (Some(path), true) => {
                let key = keys::validation_video_key(&repro.id, &run_id);
                self.ctx.objects.put_file(&key, path).await?;
                Some(key)
            }
            _ => None,
        };
        let trace_key = match (&output.trace, self.options.trace_recording) {
            (Some(path), true) => {
                let key = keys::validation_trace_key(&repro.id, &run_id);
                self.ctx.objects.put_file(&key, path).await?;
                Some(key)
            }
            _ => None,
        };

        Ok(RunRecord {
            repro_id: repro.id.clone(),
            iteration,
            passed: output.passed,
            duration_ms: output.duration_ms,
            exit_code: output.exit_code,
            logs: output.logs,
            video_key,
            trace_key,
        })
    }

    async fn minimize_steps(
        &self,
        repro: &Repro,
        steps: Vec<Step>,
        determinism: &DeterminismConfig,
    ) -> Result<MinimizeOutcome, WorkerError> {
        let probe = EnvelopeStepProbe {
            handler: self,
            repro,
            determinism,
        };
        ddmin(steps, &probe, self.options.minimization_timeout).await
    }
}

/// ddmin probe that re-synthesizes a spec from the candidate steps and runs
/// it under the full envelope, so nondeterminism cannot fake a reduction.
struct EnvelopeStepProbe<'a> {
    handler: &'a ValidateHandler,
    repro: &'a Repro,
    determinism: &'a DeterminismConfig,
}

#[async_trait]
impl StepProbe for EnvelopeStepProbe<'_> {
    async fn fails(&self, candidate: &[Step]) -> Result<bool, WorkerError> {
        let scope = self.handler.ctx.temp_scope("validate-minimize")?;
        let title = self.repro.title.clone().unwrap_or_else(|| "Minimized repro".to_string());
        let artifacts = generate_artifacts(&title, &Interactions::default(), candidate);
        for (name, content) in artifacts.files() {
            tokio::fs::write(scope.file(name), content)
                .await
                .map_err(|err| WorkerError::Internal(err.to_string()))?;
        }

        let probe_id = format!("{}_min_{}", self.repro.id, candidate.len());
        let output = self
            .handler
            .executor
            .execute(scope.path(), &probe_id, self.determinism)
            .await?;
        Ok(!output.passed)
    }
}

#[async_trait]
impl Handler for ValidateHandler {
    fn role(&self) -> &'static str {
        "validate"
    }

    fn subject(&self) -> Subject {
        Subject::ReproValidate
    }

    async fn handle(&self, payload: &[u8]) -> Result<(), WorkerError> {
        let request: ValidateRequest = decode(payload)?;
        let config = request.validation_config;
        let repro_id = config.repro_id.clone();
        let runs = self.options.clamp_runs(config.runs);

        let repro = repros::fetch_repro(&self.ctx.db, &repro_id).await?;
        let steps = repros::fetch_steps(&self.ctx.db, &repro_id).await?;
        info!(repro_id = %repro_id, runs, steps = steps.len(), "starting validation cycle");

        let scope = self.ctx.temp_scope("validate")?;

        // Concurrent runs, bounded; iteration numbering is stable so
        // redelivery converges on the same run rows.
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_runs.max(1)));
        let mut tasks = Vec::with_capacity(runs as usize);
        for iteration in 1..=runs {
            let semaphore = Arc::clone(&semaphore);
            let repro = &repro;
            let scope = &scope;
            let determinism = &config.determinism;
            tasks.push(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| WorkerError::Internal("semaphore closed".into()))?;
                self.execute_one_run(repro, scope, iteration, determinism).await
            });
        }
        let results = futures_util::future::join_all(tasks).await;

        let mut run_records = Vec::with_capacity(results.len());
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(record) => run_records.push(record),
                Err(err) => {
                    // A failed execution still counts as a failed run; the
                    // cycle completes with what it has.
                    warn!(repro_id = %repro_id, iteration = i + 1, error = %err, "run execution failed");
                    run_records.push(RunRecord {
                        repro_id: repro_id.clone(),
                        iteration: i as u32 + 1,
                        passed: false,
                        duration_ms: 0,
                        exit_code: -1,
                        logs: err.to_string(),
                        video_key: None,
                        trace_key: None,
                    });
                }
            }
        }

        let stability = stability_metrics(&run_records);
        info!(
            repro_id = %repro_id,
            stability = stability.stability_score,
            flaky = stability.flaky_score,
            class = %stability.class,
            "validation runs complete"
        );

        let minimization = if self.options.enable_minimization
            && should_minimize(
                stability.flaky_score,
                stability.failed_runs,
                self.options.flaky_threshold,
            )
            && !steps.is_empty()
        {
            match self.minimize_steps(&repro, steps.clone(), &config.determinism).await {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    // Minimization is advisory; its failure never fails the
                    // validation.
                    warn!(repro_id = %repro_id, error = %err, "minimization failed");
                    None
                }
            }
        } else {
            None
        };

        for record in &run_records {
            repros::insert_run(&self.ctx.db, record).await?;
        }
        repros::update_repro_status(&self.ctx.db, &repro_id, ReproStatus::Validated).await?;
        repros::update_repro_stability(&self.ctx.db, &repro_id, stability.stability_score)
            .await?;

        let mut summary = serde_json::to_value(&stability)
            .map_err(|err| WorkerError::Internal(err.to_string()))?;
        if let (Some(outcome), serde_json::Value::Object(map)) = (&minimization, &mut summary) {
            map.insert(
                "minimization".to_string(),
                serde_json::json!({
                    "original_steps": steps.len(),
                    "minimized_steps": outcome.steps.len(),
                    "evaluations": outcome.evaluations,
                    "budget_exhausted": outcome.budget_exhausted,
                }),
            );
        }
        self.ctx
            .cache
            .put_json(&keys::stability_key(&repro_id), &summary, keys::ttl::STABILITY)
            .await?;

        info!(repro_id = %repro_id, "validation cycle persisted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
