// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User interaction extraction from HAR entries.

use serde::Serialize;
use std::collections::BTreeMap;

use retrace_signals::har::{HarFile, PostData, RawEntry, RawRequest, RawResponse};

/// URL path fragments that mark an entry as an API call.
const API_URL_MARKERS: [&str; 4] = ["/api/", "/v1/", "/v2/", "/graphql"];

/// Key under which an unparseable POST body is preserved.
pub const RAW_BODY_KEY: &str = "_raw";

#[derive(Debug, Clone, Serialize)]
pub struct Navigation {
    pub url: String,
    pub timestamp: Option<String>,
    pub status: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSubmission {
    pub url: String,
    pub form_data: BTreeMap<String, String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiCall {
    pub url: String,
    pub method: String,
    pub request_body: Option<String>,
    pub response_status: u16,
}

/// Classified interactions in HAR entry order within each class.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Interactions {
    pub navigation: Vec<Navigation>,
    pub form_submissions: Vec<FormSubmission>,
    pub api_calls: Vec<ApiCall>,
}

impl Interactions {
    pub fn total(&self) -> usize {
        self.navigation.len() + self.form_submissions.len() + self.api_calls.len()
    }

    /// Base URL for the generated test: scheme+host seen most often, falling
    /// back to a placeholder when the HAR held no parseable URL.
    pub fn base_url(&self) -> String {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let urls = self
            .navigation
            .iter()
            .map(|n| n.url.as_str())
            .chain(self.form_submissions.iter().map(|f| f.url.as_str()))
            .chain(self.api_calls.iter().map(|a| a.url.as_str()));
        for url in urls {
            if let Some(host) = host_of(url) {
                *counts.entry(host).or_default() += 1;
            }
        }
        counts
            .into_iter()
            .max_by_key(|(_, n)| *n)
            .map(|(host, _)| format!("https://{}", host))
            .unwrap_or_else(|| "https://example.com".to_string())
    }
}

/// Classify every HAR entry into navigation / form submission / API call.
///
/// Order of checks matters: a POST with form params is a form submission even
/// when the URL looks API-shaped.
pub fn extract_interactions(har: &HarFile) -> Interactions {
    let mut out = Interactions::default();

    for entry in &har.log.entries {
        let method = entry.request.method.to_uppercase();

        if method == "GET" && is_html_response(&entry.response) {
            out.navigation.push(Navigation {
                url: entry.request.url.clone(),
                timestamp: entry.started_date_time.clone(),
                status: entry.response.status,
            });
        } else if method == "POST" && has_form_data(&entry.request) {
            out.form_submissions.push(FormSubmission {
                url: entry.request.url.clone(),
                form_data: parse_form_data(&entry.request),
                timestamp: entry.started_date_time.clone(),
            });
        } else if is_api_call(entry) {
            out.api_calls.push(ApiCall {
                url: entry.request.url.clone(),
                method,
                request_body: entry.request.post_data.as_ref().and_then(|p| p.text.clone()),
                response_status: entry.response.status,
            });
        }
    }

    out
}

fn is_html_response(response: &RawResponse) -> bool {
    let mime = response.content.mime_type.to_lowercase();
    mime.contains("text/html") || mime.is_empty()
}

fn has_form_data(request: &RawRequest) -> bool {
    match &request.post_data {
        Some(post) => !post.params.is_empty() || post.text.is_some(),
        None => false,
    }
}

/// Form data precedence: `params` key/value pairs, then a JSON object body,
/// then the raw text under [`RAW_BODY_KEY`].
fn parse_form_data(request: &RawRequest) -> BTreeMap<String, String> {
    let Some(post) = &request.post_data else {
        return BTreeMap::new();
    };
    parse_post_data(post)
}

pub(crate) fn parse_post_data(post: &PostData) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();

    if !post.params.is_empty() {
        for param in &post.params {
            out.insert(param.name.clone(), param.value.clone());
        }
        return out;
    }

    if let Some(text) = &post.text {
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(text) {
            for (k, v) in map {
                let value = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                out.insert(k, value);
            }
            return out;
        }
        out.insert(RAW_BODY_KEY.to_string(), text.clone());
    }

    out
}

fn is_api_call(entry: &RawEntry) -> bool {
    let json_header = entry
        .request
        .headers
        .iter()
        .chain(entry.response.headers.iter())
        .any(|h| {
            matches!(h.name.to_lowercase().as_str(), "content-type" | "accept")
                && h.value.to_lowercase().contains("json")
        });
    let url = entry.request.url.to_lowercase();
    json_header || API_URL_MARKERS.iter().any(|m| url.contains(m))
}

fn host_of(url: &str) -> Option<String> {
    let rest = url.split_once("://").map(|(_, r)| r)?;
    let host = rest.split(['/', '?', '#']).next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

#[cfg(test)]
#[path = "interactions_tests.rs"]
mod tests;
