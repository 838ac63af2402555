// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! retrace-runtime: the worker skeleton every role runs on.
//!
//! A worker is this skeleton parameterized by a [`Handler`]. The skeleton
//! owns the four collaborator connections (bus, relational store, cache,
//! object store), the at-least-once dispatch loop, concurrency admission,
//! poison-message quarantine and graceful drain.

pub mod bus;
pub mod config;
pub mod context;
pub mod error;
pub mod shutdown;
pub mod tempdir;
pub mod worker;

pub use bus::{Bus, BusMessage, NatsBus};
pub use config::WorkerConfig;
pub use context::WorkerContext;
pub use error::{Disposition, WorkerError};
pub use shutdown::wait_for_shutdown;
pub use tempdir::TempScope;
pub use worker::{Handler, Worker, WorkerOptions};

#[cfg(any(test, feature = "test-support"))]
pub use bus::memory::MemoryBus;
