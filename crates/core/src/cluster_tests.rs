// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn params(eps: f64, min_samples: usize) -> ClusterParams {
    ClusterParams { eps, min_samples }
}

#[test]
fn empty_input_yields_no_clusters() {
    assert!(density_cluster(&[], ClusterParams::default()).is_empty());
}

#[test]
fn near_duplicates_cluster_and_outlier_stays_alone() {
    // Two nearly-parallel vectors plus one orthogonal outlier.
    let points = vec![
        vec![1.0, 0.0, 0.01],
        vec![1.0, 0.0, 0.02],
        vec![0.0, 1.0, 0.0],
    ];
    let clusters = density_cluster(&points, params(0.3, 2));
    assert_eq!(clusters.len(), 2);
    let big: Vec<usize> = clusters.iter().find(|c| c.len() == 2).cloned().unwrap();
    assert_eq!(big, vec![0, 1]);
    assert!(clusters.contains(&vec![2]));
}

#[test]
fn every_point_lands_in_exactly_one_cluster() {
    let points = vec![
        vec![1.0, 0.0],
        vec![0.9, 0.1],
        vec![0.0, 1.0],
        vec![-1.0, 0.0],
        vec![0.95, 0.05],
    ];
    let clusters = density_cluster(&points, params(0.2, 2));
    let mut seen: Vec<usize> = clusters.into_iter().flatten().collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
}

#[test]
fn min_samples_above_group_size_makes_everything_noise() {
    let points = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
    let clusters = density_cluster(&points, params(0.3, 3));
    assert_eq!(clusters, vec![vec![0], vec![1]]);
}

#[test]
fn chained_neighbourhoods_merge_into_one_cluster() {
    // a-b close, b-c close, a-c only reachable through b.
    let points = vec![
        vec![1.0, 0.00],
        vec![1.0, 0.35],
        vec![1.0, 0.70],
    ];
    let clusters = density_cluster(&points, params(0.06, 2));
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].len(), 3);
}
