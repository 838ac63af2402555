// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Egress shaping through tc netem.

use crate::exec::{run_checked, Exec};
use crate::EnvelopeError;

/// Shaping rule applied to one interface's root qdisc.
#[derive(Debug, Clone)]
pub struct NetworkShaping {
    pub interface: String,
    pub latency_ms: u64,
    pub bandwidth_kbps: u64,
}

impl NetworkShaping {
    /// `tc qdisc add` arguments for this rule.
    pub fn add_args(&self) -> Vec<String> {
        vec![
            "qdisc".into(),
            "add".into(),
            "dev".into(),
            self.interface.clone(),
            "root".into(),
            "netem".into(),
            "delay".into(),
            format!("{}ms", self.latency_ms),
            "rate".into(),
            format!("{}kbit", self.bandwidth_kbps),
        ]
    }

    /// `tc qdisc del` arguments removing the rule.
    pub fn del_args(&self) -> Vec<String> {
        vec![
            "qdisc".into(),
            "del".into(),
            "dev".into(),
            self.interface.clone(),
            "root".into(),
            "netem".into(),
        ]
    }

    /// Install the rule. A refusal is a policy violation.
    pub async fn apply(&self, exec: &dyn Exec) -> Result<(), EnvelopeError> {
        run_checked(exec, "tc", &self.add_args()).await?;
        Ok(())
    }

    /// Remove the rule; called on every exit path.
    pub async fn remove(&self, exec: &dyn Exec) -> Result<(), EnvelopeError> {
        run_checked(exec, "tc", &self.del_args()).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
