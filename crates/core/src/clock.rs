// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling.
//!
//! Workers stamp records through a [`Clock`] so tests can pin time, and so the
//! determinism envelope can substitute a [`FrozenClock`] for everything that
//! runs inside it.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A clock that provides the current time
pub trait Clock: Send + Sync {
    /// Monotonic instant for measuring durations.
    fn now(&self) -> Instant;
    /// Wall-clock time for record stamps and frozen-time bindings.
    fn wall(&self) -> DateTime<Utc>;

    fn epoch_ms(&self) -> u64 {
        let ms = self.wall().timestamp_millis();
        if ms < 0 {
            0
        } else {
            ms as u64
        }
    }
}

/// Real system clock
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock pinned to a fixed instant.
///
/// The envelope's time-freeze layer hands one of these to everything executing
/// inside it; `now()` stays monotonic so timeouts keep working.
#[derive(Clone)]
pub struct FrozenClock {
    frozen_at: DateTime<Utc>,
}

impl FrozenClock {
    pub fn at(frozen_at: DateTime<Utc>) -> Self {
        Self { frozen_at }
    }

    /// Freeze at the current wall time shifted by `offset` (may be negative).
    pub fn offset_from_now(offset: chrono::Duration) -> Self {
        Self { frozen_at: Utc::now() + offset }
    }

    pub fn frozen_at(&self) -> DateTime<Utc> {
        self.frozen_at
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        self.frozen_at
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
    wall: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
            wall: Arc::new(Mutex::new(
                DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
            )),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
        let mut wall = self.wall.lock();
        *wall += chrono::Duration::from_std(duration).unwrap_or_default();
    }

    /// Set the wall clock to a specific instant
    pub fn set_wall(&self, at: DateTime<Utc>) {
        *self.wall.lock() = at;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }

    fn wall(&self) -> DateTime<Utc> {
        *self.wall.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
