// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! retrace-signals: structured parsing of raw telemetry.
//!
//! Pure transforms from artifact bytes to structured records: HAR documents,
//! log entries, error signatures, embedding clusters, ingest text frames and
//! document chunks. All I/O stays in the worker crates.

pub mod chunk;
pub mod cluster;
pub mod extract;
pub mod har;
pub mod logparse;
pub mod signature;

pub use chunk::{split_chunks, ChunkParams};
pub use cluster::{cluster_signatures, embed_checked, Embed, EmbedError, HashEmbed};
pub use extract::{
    har_text, log_text, truncate_chars, ExtractError, TextExtract, UnavailableExtract,
    MAX_EXTRACT_CHARS,
};
pub use har::{parse_har, parse_har_file, HarDocument, HarEntry, HarError, HarPage, HarSummary};
pub use logparse::{parse_log, LogEntry, LogLevel, LogSummary, ParsedLog};
pub use signature::extract_signature;
