// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! retrace-worker: run one pipeline role on the shared skeleton.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use retrace_envelope::{EnvelopeExecutor, ProcSampler, SystemExec};
use retrace_runtime::{
    wait_for_shutdown, Handler, NatsBus, Worker, WorkerConfig, WorkerContext, WorkerOptions,
};
use retrace_signals::{HashEmbed, UnavailableExtract};
use retrace_workers::cli::CliBuildHandler;
use retrace_workers::determinism::{CacheResourceLog, DeterminismHandler, DeterminismOptions};
use retrace_workers::export::{ExportHandler, ExportTargets};
use retrace_workers::ingest::{IngestExtractors, IngestHandler};
use retrace_workers::map::{MapHandler, MapOptions};
use retrace_workers::shape::{DataShapeHandler, ShapeOptions};
use retrace_workers::signal::{SignalHandler, SignalOptions};
use retrace_workers::synth::SynthHandler;
use retrace_workers::transforms::{RegexPiiScrub, Unconfigured};
use retrace_workers::validate::{EnvelopeRunExecutor, ValidateHandler, ValidateOptions};

#[derive(Parser)]
#[command(name = "retrace-worker", about = "Retrace pipeline worker", version)]
struct Args {
    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand)]
enum Role {
    /// Extract text from uploaded signals into report descriptions
    Ingest,
    /// Parse signals and cluster error signatures
    Signal,
    /// Repository analysis, module guesses and doc search
    Map,
    /// Generate reproduction scenarios from HAR interactions
    Synth,
    /// Generate fixtures with PII scrubbing and integrity checks
    Shape,
    /// Run test bodies under the determinism envelope
    Determinism,
    /// N-run validation with stability scoring and minimization
    Validate,
    /// Build per-ecosystem CLI reproduction trees
    Cli,
    /// Deliver validated repros as PRs, sandboxes, tarballs or reports
    Export,
}

fn init_tracing(config: &WorkerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    match std::env::var("RETRACE_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "retrace-worker.log");
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(appender).init();
        }
        Err(_) => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

fn envelope_executor(ctx: &Arc<WorkerContext>) -> Arc<EnvelopeExecutor> {
    let options = DeterminismOptions::load();
    Arc::new(EnvelopeExecutor::new(
        Arc::new(SystemExec),
        Arc::new(ProcSampler),
        Arc::new(CacheResourceLog::new(ctx.cache.clone())),
        options.network_interface,
    ))
}

fn build_handler(
    role: &Role,
    ctx: &Arc<WorkerContext>,
    bus: &Arc<NatsBus>,
) -> Arc<dyn Handler> {
    match role {
        Role::Ingest => Arc::new(IngestHandler::new(
            Arc::clone(ctx),
            IngestExtractors {
                ocr: Arc::new(UnavailableExtract),
                asr: Arc::new(UnavailableExtract),
            },
        )),
        Role::Signal => Arc::new(SignalHandler::new(
            Arc::clone(ctx),
            Arc::new(HashEmbed),
            SignalOptions::load(),
        )),
        Role::Map => Arc::new(MapHandler::new(
            Arc::clone(ctx),
            Arc::clone(bus) as Arc<dyn retrace_runtime::Bus>,
            Arc::new(HashEmbed),
            MapOptions::load(),
        )),
        Role::Synth => Arc::new(SynthHandler::new(Arc::clone(ctx))),
        Role::Shape => Arc::new(DataShapeHandler::new(
            Arc::clone(ctx),
            Arc::new(RegexPiiScrub),
            ShapeOptions::load(),
        )),
        Role::Determinism => {
            Arc::new(DeterminismHandler::new(Arc::clone(ctx), envelope_executor(ctx)))
        }
        Role::Validate => Arc::new(ValidateHandler::new(
            Arc::clone(ctx),
            Arc::new(EnvelopeRunExecutor::new(envelope_executor(ctx))),
            ValidateOptions::load(),
        )),
        Role::Cli => Arc::new(CliBuildHandler::new(
            Arc::clone(ctx),
            Arc::clone(bus) as Arc<dyn retrace_runtime::Bus>,
        )),
        Role::Export => Arc::new(ExportHandler::new(
            Arc::clone(ctx),
            Arc::clone(bus) as Arc<dyn retrace_runtime::Bus>,
            ExportTargets {
                git: Arc::new(Unconfigured("git host")),
                sandbox: Arc::new(Unconfigured("sandbox host")),
                renderer: Arc::new(Unconfigured("pdf renderer")),
            },
        )),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = WorkerConfig::load();
    init_tracing(&config);

    let options = WorkerOptions {
        max_concurrent_tasks: config.max_concurrent_tasks,
        redelivery_budget: config.redelivery_budget,
        drain_timeout: config.drain_timeout,
    };

    let ctx = Arc::new(
        WorkerContext::connect(config.clone())
            .await
            .context("connecting store collaborators")?,
    );
    let bus = Arc::new(NatsBus::connect(&config.nats_url).await);

    let handler = build_handler(&args.role, &ctx, &bus);
    info!(role = handler.role(), "starting worker");

    let worker = Arc::new(Worker::new(Arc::clone(&bus), handler, options));
    let cancel = worker.cancel_token();

    let run = {
        let worker = Arc::clone(&worker);
        tokio::spawn(async move { worker.run().await })
    };

    wait_for_shutdown(cancel).await;
    run.await
        .context("worker task panicked")?
        .context("worker run failed")?;

    info!("worker stopped");
    Ok(())
}
