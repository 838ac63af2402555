// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delta minimization of repro steps (Zeller's ddmin).
//!
//! Every candidate evaluation re-runs the reduced step sequence through the
//! deterministic envelope; reductions are only kept when the reduced test
//! still fails, so the result is failure-preserving.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use retrace_core::Step;
use retrace_runtime::WorkerError;

/// Evaluates whether a candidate step sequence still fails.
#[async_trait]
pub trait StepProbe: Send + Sync {
    async fn fails(&self, steps: &[Step]) -> Result<bool, WorkerError>;
}

/// Result of one minimization pass.
#[derive(Debug, Clone)]
pub struct MinimizeOutcome {
    pub steps: Vec<Step>,
    pub evaluations: u32,
    /// True when the time budget expired before the algorithm converged.
    pub budget_exhausted: bool,
}

/// ddmin over the step sequence, bounded by a hard time budget.
///
/// On budget expiry the current best-known failing sequence is returned. A
/// sequence of fewer than two steps returns unchanged with zero evaluations.
pub async fn ddmin(
    steps: Vec<Step>,
    probe: &dyn StepProbe,
    budget: Duration,
) -> Result<MinimizeOutcome, WorkerError> {
    if steps.len() < 2 {
        return Ok(MinimizeOutcome { steps, evaluations: 0, budget_exhausted: false });
    }

    let started = tokio::time::Instant::now();
    let mut current = steps;
    let mut n = 2usize;
    let mut evaluations = 0u32;

    'outer: while current.len() >= 2 {
        let subsets = partition(&current, n);
        let mut reduced = false;

        for subset in &subsets {
            if started.elapsed() >= budget {
                warn!(
                    remaining_steps = current.len(),
                    evaluations, "minimization budget expired, returning best known"
                );
                return Ok(MinimizeOutcome {
                    steps: reindex(current),
                    evaluations,
                    budget_exhausted: true,
                });
            }

            let complement = complement_of(&current, subset);
            if complement.is_empty() {
                continue;
            }
            evaluations += 1;
            if probe.fails(&complement).await? {
                current = complement;
                n = n.saturating_sub(1).max(2);
                reduced = true;
                break;
            }
        }

        if reduced {
            continue 'outer;
        }
        if n < current.len() {
            n = (n * 2).min(current.len());
        } else {
            break;
        }
    }

    info!(minimized_steps = current.len(), evaluations, "minimization converged");
    Ok(MinimizeOutcome { steps: reindex(current), evaluations, budget_exhausted: false })
}

/// Split into `n` contiguous subsets, as evenly as the length allows.
fn partition(steps: &[Step], n: usize) -> Vec<Vec<Step>> {
    let len = steps.len();
    let n = n.min(len).max(1);
    let base = len / n;
    let extra = len % n;

    let mut out = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let size = base + usize::from(i < extra);
        out.push(steps[start..start + size].to_vec());
        start += size;
    }
    out
}

fn complement_of(steps: &[Step], subset: &[Step]) -> Vec<Step> {
    steps
        .iter()
        .filter(|step| !subset.iter().any(|s| s.order_idx == step.order_idx))
        .cloned()
        .collect()
}

/// Rewrite `order_idx` dense from 0 so the minimized sequence satisfies the
/// step-ordering invariant.
fn reindex(mut steps: Vec<Step>) -> Vec<Step> {
    for (i, step) in steps.iter_mut().enumerate() {
        step.order_idx = i as u32;
    }
    steps
}

#[cfg(test)]
#[path = "minimize_tests.rs"]
mod tests;
