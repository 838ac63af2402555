// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signature clustering over sentence embeddings.

use thiserror::Error;
use tracing::warn;

use retrace_core::{density_cluster, ClusterParams, ErrorSignature, EMBEDDING_DIM};

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding backend unavailable: {0}")]
    Unavailable(String),

    #[error("embedding has wrong dimension: expected {expected}, got {got}")]
    WrongDimension { expected: usize, got: usize },
}

/// Opaque sentence-embedding transform into the shared 384-dim space.
///
/// The model invocation itself is an external collaborator; this seam is all
/// the pipeline knows about it.
pub trait Embed: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

/// Embed one text and validate the dimension contract.
pub fn embed_checked(embedder: &dyn Embed, text: &str) -> Result<Vec<f32>, EmbedError> {
    let v = embedder.embed(text)?;
    if v.len() != EMBEDDING_DIM {
        return Err(EmbedError::WrongDimension { expected: EMBEDDING_DIM, got: v.len() });
    }
    Ok(v)
}

/// Cluster signature candidates and merge each cluster into a representative.
///
/// Representative of a multi-member cluster: the shortest message, with
/// `key_components` unioned across the cluster and `frequency` = |cluster|.
/// Singleton clusters pass through unchanged. The sum of frequencies over the
/// output always equals the input count.
pub fn cluster_signatures(
    embedder: &dyn Embed,
    signatures: Vec<ErrorSignature>,
    params: ClusterParams,
) -> Vec<ErrorSignature> {
    if signatures.len() < 2 {
        return signatures;
    }

    let mut embeddings = Vec::with_capacity(signatures.len());
    for sig in &signatures {
        match embed_checked(embedder, &sig.embedding_text()) {
            Ok(v) => embeddings.push(v),
            Err(err) => {
                // Without a full embedding set the clusters would be skewed;
                // fall back to the unclustered candidates.
                warn!(error = %err, "embedding failed, skipping clustering");
                return signatures;
            }
        }
    }

    let groups = density_cluster(&embeddings, params);
    let mut merged = Vec::with_capacity(groups.len());
    for group in groups {
        merged.push(merge_cluster(&signatures, &group));
    }
    merged
}

fn merge_cluster(signatures: &[ErrorSignature], member_idx: &[usize]) -> ErrorSignature {
    // Shortest message is the representative; ties keep the earliest.
    let rep_idx = member_idx
        .iter()
        .copied()
        .min_by_key(|&i| (signatures[i].message.len(), i))
        .unwrap_or(0);
    let mut rep = signatures[rep_idx].clone();

    if member_idx.len() > 1 {
        let mut components = rep.key_components.clone();
        for &i in member_idx {
            for c in &signatures[i].key_components {
                if !components.contains(c) {
                    components.push(c.clone());
                }
            }
        }
        rep.key_components = components;
        rep.frequency = member_idx.len() as u32;
    }

    rep
}

/// Model-free fallback embedding: a term-frequency projection into the shared
/// space. Deterministic, so replays embed identically.
///
/// Used when no embedding backend is configured, and by tests. Words are
/// hashed into dimension buckets and the resulting vector is L2-normalised;
/// texts sharing vocabulary land close in cosine distance.
#[derive(Clone, Copy, Default)]
pub struct HashEmbed;

impl Embed for HashEmbed {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        for word in text.split_whitespace() {
            let bucket = fnv1a(word.to_lowercase().as_bytes()) as usize % EMBEDDING_DIM;
            v[bucket] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod tests;
