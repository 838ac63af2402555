// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use retrace_signals::har::parse_har_file;

fn har(entries: serde_json::Value) -> HarFile {
    let doc = serde_json::json!({"log": {"entries": entries}}).to_string();
    parse_har_file(doc.as_bytes()).unwrap()
}

#[test]
fn get_html_is_navigation_and_post_json_is_api_call() {
    // Seed scenario: GET 200 text/html + POST 500 application/json.
    let har = har(serde_json::json!([
        {
            "request": {"method": "GET", "url": "https://shop.test/cart"},
            "response": {"status": 200, "content": {"mimeType": "text/html"}}
        },
        {
            "request": {
                "method": "POST",
                "url": "https://shop.test/api/checkout",
                "headers": [{"name": "Content-Type", "value": "application/json"}]
            },
            "response": {"status": 500, "content": {"mimeType": "application/json"}}
        }
    ]));
    let interactions = extract_interactions(&har);
    assert_eq!(interactions.navigation.len(), 1);
    assert_eq!(interactions.form_submissions.len(), 0);
    assert_eq!(interactions.api_calls.len(), 1);
    assert_eq!(interactions.api_calls[0].response_status, 500);
}

#[test]
fn get_with_empty_mime_counts_as_navigation() {
    let har = har(serde_json::json!([{
        "request": {"method": "GET", "url": "https://shop.test/"},
        "response": {"status": 200}
    }]));
    assert_eq!(extract_interactions(&har).navigation.len(), 1);
}

#[test]
fn post_with_params_is_form_submission_even_on_api_url() {
    let har = har(serde_json::json!([{
        "request": {
            "method": "POST",
            "url": "https://shop.test/api/login",
            "postData": {"params": [
                {"name": "user", "value": "ada"},
                {"name": "pass", "value": "hunter2"}
            ]}
        },
        "response": {"status": 302}
    }]));
    let interactions = extract_interactions(&har);
    assert_eq!(interactions.form_submissions.len(), 1);
    assert_eq!(interactions.api_calls.len(), 0);
    let form = &interactions.form_submissions[0].form_data;
    assert_eq!(form.get("user").map(String::as_str), Some("ada"));
}

#[test]
fn json_body_parses_into_form_fields() {
    let har = har(serde_json::json!([{
        "request": {
            "method": "POST",
            "url": "https://shop.test/submit",
            "postData": {"text": "{\"email\": \"a@b.c\", \"qty\": 2}"}
        },
        "response": {"status": 200}
    }]));
    let form = &extract_interactions(&har).form_submissions[0].form_data;
    assert_eq!(form.get("email").map(String::as_str), Some("a@b.c"));
    assert_eq!(form.get("qty").map(String::as_str), Some("2"));
}

#[test]
fn unparseable_body_lands_under_raw_key() {
    let har = har(serde_json::json!([{
        "request": {
            "method": "POST",
            "url": "https://shop.test/submit",
            "postData": {"text": "a=1&b=2"}
        },
        "response": {"status": 200}
    }]));
    let form = &extract_interactions(&har).form_submissions[0].form_data;
    assert_eq!(form.get(RAW_BODY_KEY).map(String::as_str), Some("a=1&b=2"));
}

#[yare::parameterized(
    api_path = { "https://x.test/api/users" },
    v1 = { "https://x.test/v1/users" },
    v2 = { "https://x.test/v2/users" },
    graphql = { "https://x.test/graphql" },
)]
fn api_url_markers_classify_as_api(url: &str) {
    let har = har(serde_json::json!([{
        "request": {"method": "PUT", "url": url},
        "response": {"status": 204}
    }]));
    assert_eq!(extract_interactions(&har).api_calls.len(), 1);
}

#[test]
fn base_url_picks_most_common_host() {
    let har = har(serde_json::json!([
        {"request": {"method": "GET", "url": "https://shop.test/a"},
         "response": {"status": 200, "content": {"mimeType": "text/html"}}},
        {"request": {"method": "GET", "url": "https://shop.test/b"},
         "response": {"status": 200, "content": {"mimeType": "text/html"}}},
        {"request": {"method": "GET", "url": "https://cdn.test/c"},
         "response": {"status": 200, "content": {"mimeType": "text/html"}}}
    ]));
    assert_eq!(extract_interactions(&har).base_url(), "https://shop.test");
}

#[test]
fn base_url_without_urls_falls_back() {
    assert_eq!(Interactions::default().base_url(), "https://example.com");
}
