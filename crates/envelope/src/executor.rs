// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Envelope execution state machine.
//!
//! `idle -> apply_envelope -> container_created -> ready -> executing ->
//! completed|failed -> cleanup -> idle`. Cleanup always runs, popping the
//! acquired layers in reverse: monitor cancel, network rules del, resource
//! reset, container stop+remove.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use retrace_wire::TestConfig;

use crate::container::{ContainerHandle, TestOutcome};
use crate::exec::Exec;
use crate::freeze::{fake_time_value, resolve_frozen_clock};
use crate::monitor::{spawn_monitor, ResourceLog, Sampler};
use crate::network::NetworkShaping;
use crate::stack::ReleaseStack;
use crate::EnvelopeError;

/// Phases of the execution state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecPhase {
    Idle,
    ApplyEnvelope,
    ContainerCreated,
    Ready,
    Executing,
    Completed,
    Failed,
    Cleanup,
}

retrace_core::simple_display! {
    ExecPhase {
        Idle => "idle",
        ApplyEnvelope => "apply_envelope",
        ContainerCreated => "container_created",
        Ready => "ready",
        Executing => "executing",
        Completed => "completed",
        Failed => "failed",
        Cleanup => "cleanup",
    }
}

/// Outcome of one envelope-controlled execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub test_id: String,
    pub status: ExecPhase,
    /// Layer names actually applied, in acquisition order.
    pub determinism_applied: Vec<String>,
    /// Phase trail, in transition order.
    pub phases: Vec<ExecPhase>,
    pub test_result: Option<TestOutcome>,
    pub errors: Vec<String>,
}

impl ExecutionReport {
    pub fn passed(&self) -> bool {
        self.status == ExecPhase::Completed
            && self.test_result.as_ref().is_some_and(|r| r.passed)
    }
}

/// Executes test bodies under the composed envelope.
pub struct EnvelopeExecutor {
    exec: Arc<dyn Exec>,
    sampler: Arc<dyn Sampler>,
    resource_log: Arc<dyn ResourceLog>,
    network_interface: String,
}

impl EnvelopeExecutor {
    pub fn new(
        exec: Arc<dyn Exec>,
        sampler: Arc<dyn Sampler>,
        resource_log: Arc<dyn ResourceLog>,
        network_interface: impl Into<String>,
    ) -> Self {
        Self { exec, sampler, resource_log, network_interface: network_interface.into() }
    }

    /// Run one test under the envelope. Never leaves layers behind: the
    /// release stack unwinds on success, failure and cancellation alike.
    pub async fn execute(&self, config: &TestConfig) -> ExecutionReport {
        let mut report = ExecutionReport {
            test_id: config.test_id.clone(),
            status: ExecPhase::Idle,
            determinism_applied: Vec::new(),
            phases: vec![ExecPhase::Idle],
            test_result: None,
            errors: Vec::new(),
        };

        let mut stack = ReleaseStack::new();
        let outcome = self.run_phases(config, &mut report, &mut stack).await;

        report.phases.push(ExecPhase::Cleanup);
        for (layer, err) in stack.release_all().await {
            report.errors.push(format!("cleanup {}: {}", layer, err));
        }

        match outcome {
            Ok(result) => {
                report.test_result = Some(result);
                report.status = ExecPhase::Completed;
                report.phases.insert(report.phases.len() - 1, ExecPhase::Completed);
            }
            Err(err) => {
                report.errors.insert(0, err.to_string());
                report.status = ExecPhase::Failed;
                report.phases.insert(report.phases.len() - 1, ExecPhase::Failed);
            }
        }

        info!(
            test_id = %report.test_id,
            status = %report.status,
            layers = report.determinism_applied.len(),
            "envelope execution finished"
        );
        report
    }

    async fn run_phases(
        &self,
        config: &TestConfig,
        report: &mut ExecutionReport,
        stack: &mut ReleaseStack,
    ) -> Result<TestOutcome, EnvelopeError> {
        let det = &config.determinism;

        // apply_envelope: resolve the clock binding and the cap translation
        // before anything is acquired.
        report.phases.push(ExecPhase::ApplyEnvelope);
        let frozen = resolve_frozen_clock(det);
        let fake_time = frozen.as_ref().map(fake_time_value);
        if fake_time.is_some() {
            report.determinism_applied.push("time_freezing".to_string());
        }

        // container isolation, resource caps included in its create args.
        let container =
            ContainerHandle::create(self.exec.as_ref(), config, fake_time.as_deref()).await?;
        report.phases.push(ExecPhase::ContainerCreated);
        report.determinism_applied.push("container_isolation".to_string());
        {
            let exec = Arc::clone(&self.exec);
            let handle = container.clone();
            stack.push("container", move || async move {
                handle.stop_remove(exec.as_ref()).await
            });
        }

        if det.enable_resource_limits {
            report.determinism_applied.push("resource_limits".to_string());
            // Caps are container-scoped; the reset slot documents the
            // release point in the unwind order.
            stack.push("resource_limits", || async { Ok(()) });
        }

        if det.enable_network_shaping {
            let shaping = NetworkShaping {
                interface: self.network_interface.clone(),
                latency_ms: det.network_latency_ms,
                bandwidth_kbps: det.network_bandwidth_kbps,
            };
            shaping.apply(self.exec.as_ref()).await?;
            report.determinism_applied.push("network_shaping".to_string());
            let exec = Arc::clone(&self.exec);
            stack.push("network_shaping", move || async move {
                shaping.remove(exec.as_ref()).await
            });
        }

        let monitor_cancel = spawn_monitor(
            config.test_id.clone(),
            Duration::from_secs(config.monitoring_interval_secs.max(1)),
            Arc::clone(&self.sampler),
            Arc::clone(&self.resource_log),
        );
        stack.push("monitor", move || async move {
            monitor_cancel.cancel();
            Ok(())
        });

        container.wait_ready(self.exec.as_ref()).await?;
        report.phases.push(ExecPhase::Ready);

        report.phases.push(ExecPhase::Executing);
        container.exec_test(self.exec.as_ref(), config).await
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
