// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Overlapping document chunking for the doc index.
//!
//! Chunks step by `size - overlap`, so any substring no longer than the
//! stride appears wholly in at least one chunk. A chunk prefers to end at a
//! `.` or newline when one falls within its final 30%.

/// Chunking parameters, in characters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkParams {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self { size: 1000, overlap: 200 }
    }
}

impl ChunkParams {
    fn stride_floor(&self) -> usize {
        // Overlap must leave forward progress.
        self.overlap.min(self.size.saturating_sub(1))
    }
}

/// Split text into overlapping chunks. Chunks are trimmed of surrounding
/// whitespace; empty chunks are dropped.
pub fn split_chunks(content: &str, params: ChunkParams) -> Vec<String> {
    if content.is_empty() || params.size == 0 {
        return Vec::new();
    }

    // Char-position to byte-offset map, so slicing stays boundary-safe.
    let offsets: Vec<usize> = content.char_indices().map(|(i, _)| i).collect();
    let total_chars = offsets.len();
    let byte_at = |char_pos: usize| -> usize {
        if char_pos >= total_chars {
            content.len()
        } else {
            offsets[char_pos]
        }
    };

    let overlap = params.stride_floor();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < total_chars {
        let mut end = start + params.size;

        if end < total_chars {
            let window = &content[byte_at(start)..byte_at(end)];
            if let Some(break_point) = boundary_in_tail(window, params.size) {
                end = start + break_point + 1;
            }
        }

        let chunk = content[byte_at(start)..byte_at(end)].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= total_chars {
            break;
        }
        let next = end - overlap;
        // Forward progress even when a boundary cut shrank the chunk below
        // the overlap.
        start = if next > start { next } else { end };
    }

    chunks
}

/// Last `.` or newline in the window, if it lands past 70% of the chunk size.
/// Returns a char position relative to the window start.
fn boundary_in_tail(window: &str, size: usize) -> Option<usize> {
    let cutoff = (size as f64 * 0.7) as usize;
    let mut last = None;
    for (i, c) in window.chars().enumerate() {
        if c == '.' || c == '\n' {
            last = Some(i);
        }
    }
    last.filter(|&i| i > cutoff)
}

#[cfg(test)]
#[path = "chunk_tests.rs"]
mod tests;
