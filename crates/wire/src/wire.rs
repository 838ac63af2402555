// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON encode/decode for bus payloads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("malformed payload: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode a payload as UTF-8 JSON bytes.
pub fn encode<T: Serialize>(payload: &T) -> Result<Vec<u8>, WireError> {
    serde_json::to_vec(payload).map_err(WireError::Encode)
}

/// Decode a payload from UTF-8 JSON bytes.
///
/// Unknown fields are tolerated so payloads can grow without a fleet-wide
/// redeploy.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    serde_json::from_slice(bytes).map_err(WireError::Decode)
}
