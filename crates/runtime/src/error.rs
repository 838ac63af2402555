// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker error taxonomy and the ack/nack/quarantine policy.

use thiserror::Error;

use retrace_storage::StorageError;
use retrace_wire::WireError;

/// What the dispatch loop does with a finished message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Acknowledge; the message is done (success, or terminal failure that
    /// must not loop).
    Ack,
    /// Negative-acknowledge; the bus redelivers after its backoff.
    Retry,
    /// Redelivery budget exhausted; move to the quarantine subject and ack.
    Quarantine,
}

/// Error kinds a handler can surface, mapped onto the propagation policy.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Bus / store / network failure worth retrying.
    #[error("transient I/O failure: {0}")]
    TransientIo(String),

    /// Referenced artifact does not exist; retrying cannot help.
    #[error("artifact missing: {0}")]
    ArtifactMissing(String),

    /// Payload or artifact cannot be parsed; terminal for the message.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// An opaque extractor failed; callers substitute empty output instead of
    /// failing the message, so this surfacing is always a bug.
    #[error("extractor failure: {0}")]
    ExtractorFailure(String),

    /// The OS refused a determinism toggle.
    #[error("determinism policy violation: {0}")]
    PolicyViolation(String),

    #[error("timed out: {0}")]
    Timeout(String),

    /// Redelivery budget exceeded; set by the skeleton, not handlers.
    #[error("poison message after {deliveries} deliveries")]
    PoisonMessage { deliveries: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    /// Map the taxonomy onto the dispatch policy.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::TransientIo(_) | Self::Timeout(_) | Self::Internal(_) => Disposition::Retry,
            Self::ArtifactMissing(_) | Self::MalformedInput(_) => Disposition::Ack,
            // Extractor failures are swallowed at the call site; if one gets
            // here treat it as terminal rather than looping.
            Self::ExtractorFailure(_) => Disposition::Ack,
            // A refused toggle fails the run, not the message.
            Self::PolicyViolation(_) => Disposition::Ack,
            Self::PoisonMessage { .. } => Disposition::Quarantine,
        }
    }
}

impl From<StorageError> for WorkerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ObjectMissing(key) => Self::ArtifactMissing(key),
            StorageError::RowMissing(what) => Self::ArtifactMissing(what),
            StorageError::Serde(e) => Self::MalformedInput(e.to_string()),
            StorageError::Invalid(what) => Self::MalformedInput(what),
            other => Self::TransientIo(other.to_string()),
        }
    }
}

impl From<WireError> for WorkerError {
    fn from(err: WireError) -> Self {
        Self::MalformedInput(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
