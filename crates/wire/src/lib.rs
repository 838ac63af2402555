// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus protocol for the Retrace pipeline.
//!
//! Wire format: JSON-encoded UTF-8 bytes on NATS subjects; durable consumer
//! groups are named after the worker role.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod determinism;
mod payload;
mod subject;
mod wire;

pub use determinism::{DeterminismConfig, ResourceCaps, TestConfig, ValidationConfig};
pub use payload::{
    CliCompleted, CliRequest, DataShapeOptions, DataShapeRequest, DeterminismRequest,
    ExportCompleted, ExportRequest, MappingCompleted, MappingRequest, ReportRequest,
    ValidateRequest,
};
pub use subject::{quarantine_subject, Subject};
pub use wire::{decode, encode, WireError};
