// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HAR 1.2 parsing and request/response summarisation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarError {
    #[error("invalid HAR json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw HAR file shape, limited to the fields the pipeline reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarFile {
    #[serde(default)]
    pub log: HarLog,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarLog {
    #[serde(default)]
    pub pages: Vec<RawPage>,
    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "startedDateTime")]
    pub started_date_time: Option<String>,
    #[serde(default, rename = "pageTimings")]
    pub page_timings: PageTimings,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageTimings {
    #[serde(default, rename = "onContentLoad")]
    pub on_content_load: Option<f64>,
    #[serde(default, rename = "onLoad")]
    pub on_load: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntry {
    #[serde(default, rename = "startedDateTime")]
    pub started_date_time: Option<String>,
    #[serde(default)]
    pub request: RawRequest,
    #[serde(default)]
    pub response: RawResponse,
    #[serde(default, rename = "serverIPAddress")]
    pub server_ip_address: Option<String>,
    #[serde(default)]
    pub connection: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRequest {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default, rename = "postData")]
    pub post_data: Option<PostData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    pub status: u16,
    #[serde(default, rename = "statusText")]
    pub status_text: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub content: Content,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Header {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    /// `content.size` as defined by the HAR 1.2 schema.
    #[serde(default)]
    pub size: i64,
    #[serde(default, rename = "mimeType")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PostData {
    #[serde(default, rename = "mimeType")]
    pub mime_type: String,
    #[serde(default)]
    pub params: Vec<PostParam>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PostParam {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Parsed page record.
#[derive(Debug, Clone, Serialize)]
pub struct HarPage {
    pub id: Option<String>,
    pub title: Option<String>,
    pub started_date_time: Option<String>,
    pub on_load_ms: Option<f64>,
}

/// Parsed entry record.
#[derive(Debug, Clone, Serialize)]
pub struct HarEntry {
    pub url: String,
    pub method: String,
    pub status: u16,
    pub status_text: String,
    pub request_header_count: usize,
    pub response_header_count: usize,
    pub response_size: i64,
    pub mime_type: String,
    pub server_ip_address: Option<String>,
}

/// Aggregate over all entries and pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HarSummary {
    pub total_requests: u32,
    /// Entries whose response status is >= 400.
    pub failed_requests: u32,
    pub total_size: i64,
    /// Max page onLoad timing; 0 when no page reports one.
    pub load_time: f64,
}

/// A parsed HAR document with its summary.
#[derive(Debug, Clone, Serialize)]
pub struct HarDocument {
    pub pages: Vec<HarPage>,
    pub entries: Vec<HarEntry>,
    pub summary: HarSummary,
}

/// Parse HAR bytes into structured pages, entries and a summary.
pub fn parse_har(bytes: &[u8]) -> Result<HarDocument, HarError> {
    let file: HarFile = serde_json::from_slice(bytes)?;
    Ok(summarize(&file))
}

/// Parse an already-deserialized HAR file. Exposed for synth, which needs the
/// raw request bodies as well as the summary.
pub fn parse_har_file(bytes: &[u8]) -> Result<HarFile, HarError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn summarize(file: &HarFile) -> HarDocument {
    let pages: Vec<HarPage> = file
        .log
        .pages
        .iter()
        .map(|p| HarPage {
            id: p.id.clone(),
            title: p.title.clone(),
            started_date_time: p.started_date_time.clone(),
            on_load_ms: p.page_timings.on_load,
        })
        .collect();

    let mut summary = HarSummary::default();
    let mut entries = Vec::with_capacity(file.log.entries.len());

    for raw in &file.log.entries {
        summary.total_requests += 1;
        if raw.response.status >= 400 {
            summary.failed_requests += 1;
        }
        if raw.response.content.size > 0 {
            summary.total_size += raw.response.content.size;
        }

        entries.push(HarEntry {
            url: raw.request.url.clone(),
            method: raw.request.method.clone(),
            status: raw.response.status,
            status_text: raw.response.status_text.clone(),
            request_header_count: raw.request.headers.len(),
            response_header_count: raw.response.headers.len(),
            response_size: raw.response.content.size,
            mime_type: raw.response.content.mime_type.clone(),
            server_ip_address: raw.server_ip_address.clone(),
        });
    }

    summary.load_time = pages
        .iter()
        .filter_map(|p| p.on_load_ms)
        .filter(|ms| *ms > 0.0)
        .fold(0.0, f64::max);

    HarDocument { pages, entries, summary }
}

#[cfg(test)]
#[path = "har_tests.rs"]
mod tests;
