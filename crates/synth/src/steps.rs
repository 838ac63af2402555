// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered step assembly from classified interactions.

use serde_json::json;

use retrace_core::{ReproId, Step, StepKind};

use crate::interactions::{Interactions, RAW_BODY_KEY};
use crate::selector::{locator_chain, ElementInfo};

/// Assemble the repro's ordered steps: navigations, then each form's field
/// inputs followed by its submit, then API verifications. `order_idx` is
/// dense from 0.
pub fn build_steps(repro_id: &ReproId, interactions: &Interactions) -> Vec<Step> {
    let mut steps = Vec::new();

    for nav in &interactions.navigation {
        push(
            repro_id,
            &mut steps,
            StepKind::Navigate,
            json!({
                "url": nav.url,
                "action": "goto",
                "description": format!("Navigate to {}", nav.url),
            }),
        );
    }

    for form in &interactions.form_submissions {
        for (field, value) in &form.form_data {
            if field == RAW_BODY_KEY {
                continue;
            }
            let selector = locator_chain(&ElementInfo::named_field("input", field));
            push(
                repro_id,
                &mut steps,
                StepKind::Input,
                json!({
                    "field": field,
                    "value": value,
                    "selector": selector,
                    "action": "fill",
                    "description": format!("Fill {} field", field),
                }),
            );
        }
        let submit = ElementInfo {
            tag: "button".to_string(),
            text: Some("Submit".to_string()),
            ..Default::default()
        };
        push(
            repro_id,
            &mut steps,
            StepKind::Submit,
            json!({
                "url": form.url,
                "selector": locator_chain(&submit),
                "action": "click",
                "description": "Submit form",
            }),
        );
    }

    for api in &interactions.api_calls {
        push(
            repro_id,
            &mut steps,
            StepKind::ApiVerify,
            json!({
                "url": api.url,
                "method": api.method,
                "expected_status": api.response_status,
                "description": format!("Verify API call to {}", api.url),
            }),
        );
    }

    steps
}

fn push(repro_id: &ReproId, steps: &mut Vec<Step>, kind: StepKind, payload: serde_json::Value) {
    steps.push(Step {
        repro_id: repro_id.clone(),
        order_idx: steps.len() as u32,
        kind,
        payload,
    });
}

#[cfg(test)]
#[path = "steps_tests.rs"]
mod tests;
