// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::exec::fake::FakeExec;

fn shaping() -> NetworkShaping {
    NetworkShaping { interface: "eth0".into(), latency_ms: 50, bandwidth_kbps: 1000 }
}

#[tokio::test]
async fn apply_issues_netem_add() {
    let exec = FakeExec::new();
    shaping().apply(&exec).await.unwrap();
    let lines = exec.command_lines();
    assert_eq!(lines, vec!["tc qdisc add dev eth0 root netem delay 50ms rate 1000kbit"]);
}

#[tokio::test]
async fn remove_issues_netem_del() {
    let exec = FakeExec::new();
    shaping().remove(&exec).await.unwrap();
    assert_eq!(exec.command_lines(), vec!["tc qdisc del dev eth0 root netem"]);
}

#[tokio::test]
async fn refused_rule_is_a_policy_violation() {
    let exec = FakeExec::new();
    exec.script_failure("qdisc add", 2, "RTNETLINK answers: Operation not permitted");
    let err = shaping().apply(&exec).await.unwrap_err();
    assert!(matches!(err, EnvelopeError::Policy(_)));
    assert!(err.to_string().contains("not permitted"));
}
