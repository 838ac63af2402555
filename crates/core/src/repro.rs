// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generated reproduction cases and their ordered steps.

use serde::{Deserialize, Serialize};

use crate::report::ReportId;

crate::define_id! {
    /// Unique identifier for a generated reproduction case.
    pub struct ReproId;
}

/// Lifecycle status of a repro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReproStatus {
    Created,
    Validated,
    Exported,
}

crate::simple_display! {
    ReproStatus {
        Created => "created",
        Validated => "validated",
        Exported => "exported",
    }
}

/// One atomic action in a repro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Navigate,
    Input,
    Click,
    Submit,
    Assert,
    ApiVerify,
}

crate::simple_display! {
    StepKind {
        Navigate => "navigate",
        Input => "input",
        Click => "click",
        Submit => "submit",
        Assert => "assert",
        ApiVerify => "api_verify",
    }
}

/// One ordered action within a repro.
///
/// `order_idx` is dense and 0-based within the owning repro; Validate executes
/// steps strictly in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub repro_id: ReproId,
    pub order_idx: u32,
    pub kind: StepKind,
    pub payload: serde_json::Value,
}

/// A generated reproduction case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repro {
    pub id: ReproId,
    pub report_id: ReportId,
    /// Test framework tag; synth always emits `playwright`.
    pub framework: String,
    /// Entry file name inside the generated artifact set.
    pub entry: String,
    /// Compose descriptor for the deterministic environment.
    pub docker_compose: serde_json::Value,
    /// Seed fixtures the test loads.
    pub seed: serde_json::Value,
    pub status: ReproStatus,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Check the dense 0-based ordering invariant over a step slice.
///
/// Returns the first violation (expected, found) if any.
pub fn check_step_order(steps: &[Step]) -> Result<(), (u32, u32)> {
    for (expected, step) in steps.iter().enumerate() {
        let expected = expected as u32;
        if step.order_idx != expected {
            return Err((expected, step.order_idx));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "repro_tests.rs"]
mod tests;
