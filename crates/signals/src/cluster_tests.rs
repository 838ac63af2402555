// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use retrace_core::{ErrorKind, ReportId, Severity, SignatureHash};

fn sig(message: &str, details: &str, components: &[&str]) -> ErrorSignature {
    ErrorSignature {
        hash: SignatureHash::new(format!("h-{message}")),
        report_id: ReportId::new("r-1"),
        kind: ErrorKind::GenericError,
        message: message.to_string(),
        details: Some(details.to_string()),
        stack_trace: None,
        key_components: components.iter().map(|c| c.to_string()).collect(),
        severity: Severity::High,
        frequency: 1,
    }
}

#[test]
fn hash_embed_is_deterministic_and_normalised() {
    let a = HashEmbed.embed("cannot read property map").unwrap();
    let b = HashEmbed.embed("cannot read property map").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), retrace_core::EMBEDDING_DIM);
    let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
}

#[test]
fn similar_texts_are_closer_than_unrelated_ones() {
    let a = HashEmbed.embed("TypeError cannot read property map of undefined").unwrap();
    let b = HashEmbed.embed("TypeError cannot read property length of undefined").unwrap();
    let c = HashEmbed.embed("database connection pool exhausted entirely").unwrap();
    assert!(
        retrace_core::cosine_distance(&a, &b) < retrace_core::cosine_distance(&a, &c)
    );
}

#[test]
fn near_duplicates_merge_with_summed_frequency() {
    let signatures = vec![
        sig("TypeError cannot read property map of undefined", "at cart", &["map"]),
        sig("TypeError cannot read property map of undefined rows", "at cart", &["rows"]),
        sig("completely different failure in payment gateway integration", "at pay", &["pay"]),
    ];
    let merged = cluster_signatures(&HashEmbed, signatures, ClusterParams::default());
    assert_eq!(merged.len(), 2);
    let total: u32 = merged.iter().map(|s| s.frequency).sum();
    assert_eq!(total, 3);

    let rep = merged.iter().find(|s| s.frequency == 2).unwrap();
    // Shortest message wins the representative slot.
    assert_eq!(rep.message, "TypeError cannot read property map of undefined");
    assert!(rep.key_components.contains(&"map".to_string()));
    assert!(rep.key_components.contains(&"rows".to_string()));
}

#[test]
fn single_signature_skips_clustering() {
    let signatures = vec![sig("lonely", "one", &[])];
    let merged = cluster_signatures(&HashEmbed, signatures.clone(), ClusterParams::default());
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].frequency, 1);
}

#[test]
fn failing_embedder_returns_input_unclustered() {
    struct Broken;
    impl Embed for Broken {
        fn embed(&self, _: &str) -> Result<Vec<f32>, EmbedError> {
            Err(EmbedError::Unavailable("no model".into()))
        }
    }
    let signatures = vec![sig("a b c d", "x", &[]), sig("a b c d", "x", &[])];
    let merged = cluster_signatures(&Broken, signatures.clone(), ClusterParams::default());
    assert_eq!(merged.len(), 2);
}

#[test]
fn wrong_dimension_is_a_contract_violation() {
    struct Short;
    impl Embed for Short {
        fn embed(&self, _: &str) -> Result<Vec<f32>, EmbedError> {
            Ok(vec![1.0; 3])
        }
    }
    let err = embed_checked(&Short, "text").unwrap_err();
    assert!(matches!(err, EmbedError::WrongDimension { expected: 384, got: 3 }));
}
