// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delta minimization over step sequences.

use async_trait::async_trait;
use std::time::Duration;

use retrace_core::{check_step_order, ReproId, Step, StepKind};
use retrace_workers::minimize::{ddmin, StepProbe};

fn steps(labels: &[&str]) -> Vec<Step> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| Step {
            repro_id: ReproId::new("rp-1"),
            order_idx: i as u32,
            kind: StepKind::Click,
            payload: serde_json::json!({"label": label}),
        })
        .collect()
}

struct FailsWhenBothPresent(&'static str, &'static str);

#[async_trait]
impl StepProbe for FailsWhenBothPresent {
    async fn fails(&self, candidate: &[Step]) -> Result<bool, retrace_runtime::WorkerError> {
        let has = |label: &str| candidate.iter().any(|s| s.payload["label"] == label);
        Ok(has(self.0) && has(self.1))
    }
}

#[tokio::test]
async fn abcd_requiring_b_and_d_minimizes_to_bd() {
    let probe = FailsWhenBothPresent("b", "d");
    let outcome = ddmin(steps(&["a", "b", "c", "d"]), &probe, Duration::from_secs(300))
        .await
        .unwrap();

    let labels: Vec<&str> =
        outcome.steps.iter().map(|s| s.payload["label"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["b", "d"]);
    assert!(outcome.evaluations <= 8);
    assert!(check_step_order(&outcome.steps).is_ok());
}

#[tokio::test]
async fn one_step_repro_is_returned_unchanged_without_evaluations() {
    let probe = FailsWhenBothPresent("a", "a");
    let outcome = ddmin(steps(&["a"]), &probe, Duration::from_secs(300)).await.unwrap();
    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.evaluations, 0);
}

#[tokio::test]
async fn minimized_sequence_still_fails_under_the_probe() {
    let probe = FailsWhenBothPresent("b", "d");
    let outcome = ddmin(steps(&["a", "b", "c", "d", "e", "f"]), &probe, Duration::from_secs(300))
        .await
        .unwrap();
    assert!(probe.fails(&outcome.steps).await.unwrap(), "minimization must preserve failure");
}
