// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acquired-resource stack with reverse-order release.

use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

type ReleaseFn = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = Result<(), crate::EnvelopeError>> + Send>> + Send>;

/// Stack of named release actions.
///
/// `release_all` pops in reverse acquisition order and runs every action even
/// when earlier ones fail; a layer that cannot release must not leave later
/// (earlier-acquired) layers dangling.
#[derive(Default)]
pub struct ReleaseStack {
    layers: Vec<(String, ReleaseFn)>,
}

impl ReleaseStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one release action.
    pub fn push<F, Fut>(&mut self, name: &str, release: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), crate::EnvelopeError>> + Send + 'static,
    {
        self.layers
            .push((name.to_string(), Box::new(move || Box::pin(release()))));
    }

    /// Names of acquired layers, in acquisition order.
    pub fn acquired(&self) -> Vec<String> {
        self.layers.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Release everything in reverse order. Returns the release errors, in
    /// the order they occurred.
    pub async fn release_all(mut self) -> Vec<(String, crate::EnvelopeError)> {
        let mut errors = Vec::new();
        while let Some((name, release)) = self.layers.pop() {
            debug!(layer = %name, "releasing envelope layer");
            if let Err(err) = release().await {
                warn!(layer = %name, error = %err, "envelope layer release failed");
                errors.push((name, err));
            }
        }
        errors
    }
}

#[cfg(test)]
#[path = "stack_tests.rs"]
mod tests;
