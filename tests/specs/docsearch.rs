// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document chunking against the retrieval contract.

use retrace_core::cosine_similarity;
use retrace_signals::{split_chunks, ChunkParams, Embed, HashEmbed};

#[test]
fn tokens_at_char_900_of_a_1500_char_file_are_wholly_in_chunk_zero() {
    let mut content = "lorem ".repeat(148);
    content.push_str("checkout coupon ");
    content.push_str(&"filler ".repeat(90));
    let content: String = content.chars().take(1500).collect();
    assert!(content[880..960].contains("checkout coupon"));

    let chunks = split_chunks(&content, ChunkParams { size: 1000, overlap: 200 });
    assert_eq!(chunks.len(), 2);
    // The 0..1000 chunk holds both tokens intact; no token is ever split
    // across a chunk boundary it fits inside.
    assert!(chunks[0].contains("checkout coupon"));
}

#[test]
fn top_ranked_chunk_contains_the_query_tokens() {
    let mut content = "lorem ".repeat(148);
    content.push_str("checkout coupon ");
    content.push_str(&"filler ".repeat(90));
    let content: String = content.chars().take(1500).collect();

    let chunks = split_chunks(&content, ChunkParams { size: 1000, overlap: 200 });
    let query = HashEmbed.embed("checkout coupon").unwrap();
    let best = chunks
        .iter()
        .map(|c| cosine_similarity(&query, &HashEmbed.embed(c).unwrap()))
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap();
    assert!(
        chunks[best].contains("checkout") && chunks[best].contains("coupon"),
        "the winning chunk must hold the query tokens"
    );
}
