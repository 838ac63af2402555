// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! retrace-envelope: the deterministic-execution envelope.
//!
//! Each layer (network shaping, clock freeze, resource caps, container
//! isolation, monitoring) is a resource acquired onto a stack; cleanup pops
//! in reverse on every exit path, including cancellation. Container and
//! traffic-control operations shell out to the `docker` and `tc` CLIs
//! through the [`Exec`] seam so the whole state machine is testable.

pub mod container;
pub mod exec;
pub mod executor;
pub mod freeze;
pub mod limits;
pub mod monitor;
pub mod network;
pub mod stack;

pub use container::{parse_test_output, ContainerHandle, TestOutcome};
pub use exec::{Exec, ExecOutput, SystemExec};
pub use executor::{EnvelopeExecutor, ExecPhase, ExecutionReport};
pub use freeze::resolve_frozen_clock;
pub use limits::cpu_quota;
pub use monitor::{ProcSampler, ResourceLog, ResourceSample, Sampler};
pub use stack::ReleaseStack;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The OS or container runtime refused a determinism toggle.
    #[error("policy violation: {0}")]
    Policy(String),

    #[error("command failed: {0}")]
    Command(String),

    #[error("container not ready after {0} seconds")]
    ReadyTimeout(u64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(any(test, feature = "test-support"))]
pub use exec::fake::FakeExec;
