// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HAR through synthesis: a GET html page plus a failing POST json call.

use retrace_core::{check_step_order, ReproId, StepKind};
use retrace_signals::{parse_har, parse_har_file};
use retrace_synth::{build_steps, extract_interactions, generate_artifacts};

fn two_entry_har() -> String {
    serde_json::json!({
        "log": {
            "entries": [
                {
                    "request": {"method": "GET", "url": "https://shop.test/cart"},
                    "response": {"status": 200, "content": {"mimeType": "text/html", "size": 512}}
                },
                {
                    "request": {
                        "method": "POST",
                        "url": "https://shop.test/api/checkout",
                        "headers": [{"name": "Content-Type", "value": "application/json"}]
                    },
                    "response": {"status": 500, "content": {"mimeType": "application/json", "size": 0}}
                }
            ]
        }
    })
    .to_string()
}

#[test]
fn summary_counts_two_requests_one_failed() {
    let doc = parse_har(two_entry_har().as_bytes()).unwrap();
    assert_eq!(doc.summary.total_requests, 2);
    assert_eq!(doc.summary.failed_requests, 1);
}

#[test]
fn synth_yields_one_navigation_and_one_api_verify_step() {
    let har = parse_har_file(two_entry_har().as_bytes()).unwrap();
    let interactions = extract_interactions(&har);
    let steps = build_steps(&ReproId::new("rp-1"), &interactions);

    let kinds: Vec<StepKind> = steps.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StepKind::Navigate, StepKind::ApiVerify]);
    assert!(!kinds.contains(&StepKind::Input), "no form steps expected");
    assert!(check_step_order(&steps).is_ok());
}

#[test]
fn generated_spec_asserts_the_failing_status() {
    let har = parse_har_file(two_entry_har().as_bytes()).unwrap();
    let interactions = extract_interactions(&har);
    let steps = build_steps(&ReproId::new("rp-1"), &interactions);
    let artifacts = generate_artifacts("Checkout 500s", &interactions, &steps);

    assert!(artifacts.test_spec.contains("page.goto('https://shop.test/cart')"));
    assert!(artifacts.test_spec.contains("toBe(500)"));
    let names: Vec<&str> = artifacts.files().iter().map(|(n, _)| *n).collect();
    assert_eq!(names, vec!["test.spec.ts", "fixtures.json", "docker-compose.yml", "README.md"]);
}
