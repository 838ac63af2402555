// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generated artifact set: playwright spec, fixtures, compose descriptor,
//! README.

use serde_json::json;

use retrace_core::{Step, StepKind};

use crate::interactions::Interactions;

/// Entry file name used for every generated repro.
pub const ENTRY_FILE: &str = "test.spec.ts";

/// The four files uploaded under `tests/generated/<repro_id>/`.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub test_spec: String,
    pub fixtures: serde_json::Value,
    pub compose: serde_yaml::Value,
    pub readme: String,
}

impl ArtifactSet {
    /// (filename, contents) pairs in upload order.
    pub fn files(&self) -> Vec<(&'static str, String)> {
        vec![
            (ENTRY_FILE, self.test_spec.clone()),
            ("fixtures.json", pretty_json(&self.fixtures)),
            ("docker-compose.yml", serde_yaml::to_string(&self.compose).unwrap_or_default()),
            ("README.md", self.readme.clone()),
        ]
    }
}

/// Build the full artifact set for a report's interactions and steps.
pub fn generate_artifacts(
    title: &str,
    interactions: &Interactions,
    steps: &[Step],
) -> ArtifactSet {
    ArtifactSet {
        test_spec: test_spec(title, interactions, steps),
        fixtures: fixtures(interactions),
        compose: compose_descriptor(),
        readme: readme(interactions),
    }
}

fn test_spec(title: &str, interactions: &Interactions, steps: &[Step]) -> String {
    let mut body = String::new();

    for step in steps {
        match step.kind {
            StepKind::Navigate => {
                if let Some(url) = step.payload["url"].as_str() {
                    body.push_str(&format!("  await page.goto('{}');\n", url));
                    body.push_str("  await page.waitForLoadState('networkidle');\n");
                }
            }
            StepKind::Input => {
                if let (Some(selector), Some(value)) =
                    (step.payload["selector"].as_str(), step.payload["value"].as_str())
                {
                    body.push_str(&format!("  await {}.fill('{}');\n", selector, value));
                }
            }
            StepKind::Click | StepKind::Submit => {
                if let Some(selector) = step.payload["selector"].as_str() {
                    body.push_str(&format!("  await {}.click();\n", selector));
                }
            }
            StepKind::Assert => {
                if let Some(expr) = step.payload["assertion"].as_str() {
                    body.push_str(&format!("  {};\n", expr));
                }
            }
            StepKind::ApiVerify => {
                let url = step.payload["url"].as_str().unwrap_or_default();
                let status = step.payload["expected_status"].as_u64().unwrap_or(200);
                body.push_str(&format!(
                    "  const response = await page.request.fetch('{}');\n", url
                ));
                body.push_str(&format!("  expect(response.status()).toBe({});\n", status));
            }
        }
    }

    if body.is_empty() {
        body.push_str(&format!("  await page.goto('{}');\n", interactions.base_url()));
        body.push_str("  await expect(page).toHaveTitle(/./);\n");
    }

    format!(
        "import {{ test, expect }} from '@playwright/test';\n\n\
         test('{}', async ({{ page }}) => {{\n{}}});\n",
        title.replace('\'', "\\'"),
        body
    )
}

fn fixtures(interactions: &Interactions) -> serde_json::Value {
    let mut form_data = serde_json::Map::new();
    for form in &interactions.form_submissions {
        for (k, v) in &form.form_data {
            form_data.insert(k.clone(), json!(v));
        }
    }

    let api_responses: Vec<serde_json::Value> = interactions
        .api_calls
        .iter()
        .map(|api| {
            json!({
                "url": api.url,
                "method": api.method,
                "status": api.response_status,
                "body": {},
            })
        })
        .collect();

    json!({
        "users": [{
            "email": "test@example.com",
            "password": "testpassword123",
            "name": "Test User",
        }],
        "form_data": form_data,
        "api_responses": api_responses,
    })
}

fn compose_descriptor() -> serde_yaml::Value {
    let compose = json!({
        "services": {
            "web-app": {
                "image": "nginx:alpine",
                "ports": ["8080:80"],
            },
            "database": {
                "image": "postgres:15-alpine",
                "environment": {
                    "POSTGRES_DB": "test_db",
                    "POSTGRES_USER": "test_user",
                    "POSTGRES_PASSWORD": "test_password",
                },
                "ports": ["5432:5432"],
            },
        },
    });
    serde_yaml::to_value(compose).unwrap_or(serde_yaml::Value::Null)
}

fn readme(interactions: &Interactions) -> String {
    format!(
        "# Generated Test Case\n\n\
         This test case was automatically generated from bug report signals.\n\n\
         ## Files\n\n\
         - `test.spec.ts` - Playwright test script\n\
         - `fixtures.json` - Test data fixtures\n\
         - `docker-compose.yml` - Test environment configuration\n\n\
         ## Running the Test\n\n\
         1. Start the test environment:\n\
         ```bash\n\
         docker-compose up -d\n\
         ```\n\n\
         2. Run the test:\n\
         ```bash\n\
         npx playwright test test.spec.ts\n\
         ```\n\n\
         ## Generated Steps\n\n\
         {} navigation steps\n\
         {} form submissions\n\
         {} API calls\n\n\
         ## Notes\n\n\
         This test was generated automatically and may require manual adjustments.\n",
        interactions.navigation.len(),
        interactions.form_submissions.len(),
        interactions.api_calls.len(),
    )
}

fn pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
