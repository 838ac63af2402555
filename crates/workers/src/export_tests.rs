// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn data() -> ReproReportData {
    ReproReportData {
        repro_id: "rp-1".to_string(),
        title: "Checkout coupon crashes".to_string(),
        description: "Applying a coupon 500s".to_string(),
        status: "validated".to_string(),
        stability_score: Some(0.6),
        test_code: "await page.goto('https://shop.test');".to_string(),
    }
}

#[test]
fn regression_test_lands_under_tests_regressions() {
    assert_eq!(
        regression_test_path(&ReproId::new("rp-1")),
        "tests/regressions/rp-1.spec.js"
    );
}

#[test]
fn test_file_embeds_title_and_code() {
    let content = test_file(&data());
    assert!(content.contains("test('Regression: Checkout coupon crashes'"));
    assert!(content.contains("await page.goto('https://shop.test');"));
}

#[test]
fn reproduction_files_cover_the_sandbox_layout() {
    let files = reproduction_files(&data());
    let paths: Vec<&str> = files.iter().map(|(p, _)| p.as_str()).collect();
    assert!(paths.contains(&"package.json"));
    assert!(paths.contains(&"playwright.config.js"));
    assert!(paths.contains(&"tests/regressions/rp-1.spec.js"));
    assert!(paths.contains(&"README.md"));

    let package = &files.iter().find(|(p, _)| p == "package.json").unwrap().1;
    assert!(package.contains("@playwright/test"));
}

#[test]
fn pr_body_carries_the_stability_score() {
    let body = pr_body(&data());
    assert!(body.contains("**Stability Score**: 0.6"));
    assert!(body.contains("tests/regressions/rp-1.spec.js"));
}

#[test]
fn pr_body_handles_missing_score() {
    let mut data = data();
    data.stability_score = None;
    assert!(pr_body(&data).contains("**Stability Score**: N/A"));
}

#[test]
fn export_id_is_stable_per_repro_and_type() {
    let a = export_id_for(&ReproId::new("rp-1"), ExportType::Docker);
    let b = export_id_for(&ReproId::new("rp-1"), ExportType::Docker);
    let c = export_id_for(&ReproId::new("rp-1"), ExportType::Pr);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.as_str(), "rp-1-docker");
}

#[test]
fn default_branch_names_the_repro() {
    assert_eq!(default_branch_name(&ReproId::new("rp-9")), "bug-repro-rp-9");
}
