// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! retrace-synth: executable test scenarios from HAR-extracted interactions.
//!
//! Pure generation: HAR bytes in, ordered steps plus a playwright artifact
//! set out. Persistence and upload happen in the synth worker.

pub mod interactions;
pub mod script;
pub mod selector;
pub mod steps;

pub use interactions::{
    extract_interactions, ApiCall, FormSubmission, Interactions, Navigation,
};
pub use script::{generate_artifacts, ArtifactSet};
pub use selector::{locator_chain, ElementInfo, SelectorStrategy};
pub use steps::build_steps;
