// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::exec::fake::FakeExec;
use crate::exec::ExecOutput;
use crate::monitor::ResourceSample;
use async_trait::async_trait;

struct NoSampler;

#[async_trait]
impl Sampler for NoSampler {
    async fn sample(&self) -> Option<ResourceSample> {
        None
    }
}

struct NullLog;

#[async_trait]
impl ResourceLog for NullLog {
    async fn record(&self, _test_id: &str, _sample: &ResourceSample) {}
}

fn executor(exec: &FakeExec) -> EnvelopeExecutor {
    EnvelopeExecutor::new(
        Arc::new(exec.clone()),
        Arc::new(NoSampler),
        Arc::new(NullLog),
        "eth0",
    )
}

fn config() -> TestConfig {
    TestConfig::new("t-1")
}

#[tokio::test]
async fn full_run_applies_all_layers_and_cleans_up() {
    let exec = FakeExec::new();
    exec.script(
        "sh -c npm test",
        ExecOutput { status: 0, stdout: "2 tests passed".into(), stderr: String::new() },
    );

    let report = executor(&exec).execute(&config()).await;
    assert_eq!(report.status, ExecPhase::Completed);
    assert!(report.passed());
    assert_eq!(
        report.determinism_applied,
        vec!["time_freezing", "container_isolation", "resource_limits", "network_shaping"]
    );
    assert!(report.errors.is_empty());

    let lines = exec.command_lines();
    let joined = lines.join("\n");
    // Shaping applied, container execed, then cleanup: tc del before rm -f.
    assert!(joined.contains("tc qdisc add dev eth0"));
    assert!(joined.contains("tc qdisc del dev eth0"));
    let del_pos = lines.iter().position(|l| l.contains("qdisc del")).unwrap();
    let rm_pos = lines.iter().rposition(|l| l.contains("docker rm -f")).unwrap();
    assert!(del_pos < rm_pos, "network released before the container");
}

#[tokio::test]
async fn phase_trail_follows_the_state_machine() {
    let exec = FakeExec::new();
    let report = executor(&exec).execute(&config()).await;
    assert_eq!(
        report.phases,
        vec![
            ExecPhase::Idle,
            ExecPhase::ApplyEnvelope,
            ExecPhase::ContainerCreated,
            ExecPhase::Ready,
            ExecPhase::Executing,
            ExecPhase::Completed,
            ExecPhase::Cleanup,
        ]
    );
}

#[tokio::test]
async fn disabled_layers_are_skipped() {
    let exec = FakeExec::new();
    let mut cfg = config();
    cfg.determinism.enable_network_shaping = false;
    cfg.determinism.enable_time_freezing = false;
    cfg.determinism.enable_resource_limits = false;

    let report = executor(&exec).execute(&cfg).await;
    assert_eq!(report.determinism_applied, vec!["container_isolation"]);
    assert!(!exec.command_lines().iter().any(|l| l.starts_with("tc ")));
}

#[tokio::test]
async fn refused_network_rule_fails_run_but_releases_container() {
    let exec = FakeExec::new();
    exec.script_failure("qdisc add", 2, "Operation not permitted");

    let report = executor(&exec).execute(&config()).await;
    assert_eq!(report.status, ExecPhase::Failed);
    assert!(report.errors[0].contains("not permitted"));
    // The container acquired before the failing layer was still removed.
    let lines = exec.command_lines();
    assert!(lines.iter().any(|l| l.contains("docker rm -f retrace-det-t-1")));
}

#[tokio::test]
async fn failing_test_command_reports_failed_outcome() {
    let exec = FakeExec::new();
    exec.script(
        "sh -c npm test",
        ExecOutput { status: 1, stdout: "1 tests failed".into(), stderr: String::new() },
    );
    let report = executor(&exec).execute(&config()).await;
    // The envelope completed; the test inside it did not pass.
    assert_eq!(report.status, ExecPhase::Completed);
    assert!(!report.passed());
    assert_eq!(report.test_result.as_ref().unwrap().tests_failed, 1);
}
