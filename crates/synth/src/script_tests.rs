// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::interactions::{ApiCall, Navigation};
use crate::steps::build_steps;
use retrace_core::ReproId;

fn sample_interactions() -> Interactions {
    Interactions {
        navigation: vec![Navigation {
            url: "https://shop.test/cart".to_string(),
            timestamp: None,
            status: 200,
        }],
        form_submissions: vec![],
        api_calls: vec![ApiCall {
            url: "https://shop.test/api/checkout".to_string(),
            method: "POST".to_string(),
            request_body: None,
            response_status: 500,
        }],
    }
}

fn sample_artifacts() -> ArtifactSet {
    let interactions = sample_interactions();
    let steps = build_steps(&ReproId::new("rp-1"), &interactions);
    generate_artifacts("Checkout fails with 500", &interactions, &steps)
}

#[test]
fn spec_contains_navigation_and_api_assertion() {
    let artifacts = sample_artifacts();
    assert!(artifacts.test_spec.contains("await page.goto('https://shop.test/cart');"));
    assert!(artifacts.test_spec.contains("expect(response.status()).toBe(500);"));
    assert!(artifacts.test_spec.contains("test('Checkout fails with 500'"));
}

#[test]
fn empty_steps_fall_back_to_minimal_spec() {
    let artifacts = generate_artifacts("Empty", &Interactions::default(), &[]);
    assert!(artifacts.test_spec.contains("toHaveTitle"));
    assert!(artifacts.test_spec.contains("https://example.com"));
}

#[test]
fn fixtures_list_mock_api_responses() {
    let artifacts = sample_artifacts();
    let responses = artifacts.fixtures["api_responses"].as_array().unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["status"], 500);
}

#[test]
fn compose_has_web_and_database_services() {
    let artifacts = sample_artifacts();
    let yaml = serde_yaml::to_string(&artifacts.compose).unwrap();
    assert!(yaml.contains("web-app"));
    assert!(yaml.contains("postgres:15-alpine"));
}

#[test]
fn artifact_files_use_fixed_names() {
    let artifacts = sample_artifacts();
    let names: Vec<&str> = artifacts.files().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["test.spec.ts", "fixtures.json", "docker-compose.yml", "README.md"]);
}

#[test]
fn readme_counts_interactions() {
    let artifacts = sample_artifacts();
    assert!(artifacts.readme.contains("1 navigation steps"));
    assert!(artifacts.readme.contains("1 API calls"));
}

#[test]
fn quote_in_title_is_escaped() {
    let artifacts = generate_artifacts("it's broken", &Interactions::default(), &[]);
    assert!(artifacts.test_spec.contains("test('it\\'s broken'"));
}
