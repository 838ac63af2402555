// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock freezing for the envelope.
//!
//! The frozen instant comes from the config: an explicit ISO-8601 instant,
//! or now + offset. Inside the envelope the binding is a [`FrozenClock`] for
//! in-process code and a `FAKE_TIME` environment variable for the container.

use chrono::Utc;

use retrace_core::FrozenClock;
use retrace_wire::DeterminismConfig;

/// Environment variable carrying the frozen instant into the container.
pub const FAKE_TIME_ENV: &str = "FAKE_TIME";

/// Resolve the clock binding from the envelope config, or `None` when the
/// layer is disabled.
pub fn resolve_frozen_clock(config: &DeterminismConfig) -> Option<FrozenClock> {
    if !config.enable_time_freezing {
        return None;
    }
    match config.fake_time {
        Some(at) => Some(FrozenClock::at(at)),
        None => Some(FrozenClock::at(
            Utc::now() + chrono::Duration::hours(config.fake_time_offset_hours),
        )),
    }
}

/// The `FAKE_TIME` value exported into the test container.
pub fn fake_time_value(clock: &FrozenClock) -> String {
    clock.frozen_at().to_rfc3339()
}

#[cfg(test)]
#[path = "freeze_tests.rs"]
mod tests;
