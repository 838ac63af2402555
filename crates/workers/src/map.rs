// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Map worker: repository analysis, module-path guesses and doc search.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use retrace_runtime::{Bus, Handler, WorkerContext, WorkerError};
use retrace_signals::{embed_checked, split_chunks, ChunkParams, Embed};
use retrace_storage::{docs, mappings};
use retrace_wire::{decode, encode, MappingCompleted, MappingRequest, Subject};

/// Framework detection patterns: a hit on the file path scores 1.0, a hit in
/// the file body scores 0.5.
pub fn framework_patterns() -> BTreeMap<&'static str, Vec<&'static str>> {
    BTreeMap::from([
        (
            "playwright",
            vec!["playwright.config", "playwright", "page.goto", "page.click", "expect(page)"],
        ),
        ("cypress", vec!["cypress.config", "cypress", "cy.visit", "cy.get", "cy.should"]),
        ("pytest", vec!["pytest.ini", "conftest.py", "test_", "pytest", "assert"]),
        ("jest", vec!["jest.config", "package.json", "describe(", "it(", "test(", "expect("]),
    ])
}

/// Extensions eligible for doc indexing.
pub const INDEXABLE_EXTENSIONS: [&str; 17] = [
    "md", "txt", "js", "ts", "jsx", "tsx", "py", "java", "go", "rb", "php", "cs", "json",
    "yaml", "yml", "toml", "ini",
];

/// Score frameworks over (path, body) pairs and normalize to sum 1.0.
pub fn score_frameworks(files: &[(String, String)]) -> BTreeMap<String, f64> {
    let patterns = framework_patterns();
    let mut scores: BTreeMap<String, f64> =
        patterns.keys().map(|k| (k.to_string(), 0.0)).collect();

    for (path, body) in files {
        let path_lower = path.to_lowercase();
        for (framework, needles) in &patterns {
            for needle in needles {
                if path_lower.contains(needle) {
                    *scores.entry(framework.to_string()).or_default() += 1.0;
                }
                if body.contains(needle) {
                    *scores.entry(framework.to_string()).or_default() += 0.5;
                }
            }
        }
    }

    let total: f64 = scores.values().sum();
    if total > 0.0 {
        for value in scores.values_mut() {
            *value /= total;
        }
    }
    scores
}

/// Rank candidate module paths for a query: one point per query token in the
/// path, +0.5 for test/spec paths, +0.3 for config/setup paths. Top 10,
/// ties by path order.
pub fn guess_module_paths(query: &str, paths: &[String]) -> Vec<(String, f64)> {
    let tokens: Vec<String> = query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    let mut suggestions: Vec<(String, f64)> = Vec::new();
    for path in paths {
        let lower = path.to_lowercase();
        let mut score = 0.0;
        for token in &tokens {
            if lower.contains(token.as_str()) {
                score += 1.0;
            }
        }
        if lower.contains("test") || lower.contains("spec") {
            score += 0.5;
        }
        if lower.contains("config") || lower.contains("setup") {
            score += 0.3;
        }
        if score > 0.0 {
            suggestions.push((path.clone(), score));
        }
    }

    suggestions.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    suggestions.truncate(10);
    suggestions
}

/// `0.4 * max(framework score) + 0.6 * mean(similarity)`, clamped to [0, 1].
pub fn confidence_score(framework_scores: &BTreeMap<String, f64>, similarities: &[f64]) -> f64 {
    let mut confidence = 0.0;
    if let Some(max) = framework_scores.values().copied().fold(None, |acc: Option<f64>, v| {
        Some(acc.map_or(v, |a| a.max(v)))
    }) {
        confidence += max * 0.4;
    }
    if !similarities.is_empty() {
        let mean = similarities.iter().sum::<f64>() / similarities.len() as f64;
        confidence += mean * 0.6;
    }
    confidence.clamp(0.0, 1.0)
}

/// Walk a repo tree collecting relative paths, skipping VCS internals.
pub fn collect_repo_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.file_name().is_some_and(|n| n == ".git" || n == "node_modules") {
                continue;
            }
            if path.is_dir() {
                stack.push(path);
            } else if let Ok(rel) = path.strip_prefix(root) {
                files.push(rel.to_path_buf());
            }
        }
    }
    files.sort();
    files
}

fn indexable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| INDEXABLE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Doc-search and chunking knobs.
#[derive(Debug, Clone, Copy)]
pub struct MapOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub search_limit: i64,
}

impl MapOptions {
    pub fn load() -> Self {
        Self {
            chunk_size: env_parse("CHUNK_SIZE", 1000),
            chunk_overlap: env_parse("CHUNK_OVERLAP", 200),
            search_limit: env_parse("DOC_SEARCH_LIMIT", 5),
        }
    }

    pub fn chunk_params(&self) -> ChunkParams {
        ChunkParams { size: self.chunk_size, overlap: self.chunk_overlap }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

pub struct MapHandler {
    ctx: Arc<WorkerContext>,
    bus: Arc<dyn Bus>,
    embedder: Arc<dyn Embed>,
    options: MapOptions,
}

impl MapHandler {
    pub fn new(
        ctx: Arc<WorkerContext>,
        bus: Arc<dyn Bus>,
        embedder: Arc<dyn Embed>,
        options: MapOptions,
    ) -> Self {
        Self { ctx, bus, embedder, options }
    }

    /// Index every whitelisted file of a project into the doc_chunks table.
    pub async fn index_repository(
        &self,
        project_id: &str,
        repo_path: &Path,
    ) -> Result<usize, WorkerError> {
        let mut indexed = 0;
        for rel in collect_repo_files(repo_path) {
            if !indexable(&rel) {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(repo_path.join(&rel)) else {
                continue;
            };
            let meta = serde_json::json!({ "file_size": content.len() });
            for chunk in split_chunks(&content, self.options.chunk_params()) {
                let embedding = embed_checked(self.embedder.as_ref(), &chunk)
                    .map_err(|err| WorkerError::Internal(err.to_string()))?;
                docs::insert_chunk(
                    &self.ctx.db,
                    project_id,
                    &rel.to_string_lossy(),
                    &chunk,
                    &embedding,
                    &meta,
                )
                .await?;
                indexed += 1;
            }
        }
        Ok(indexed)
    }

    fn analyze_repo(&self, query: &str, repo_path: &Path) -> (BTreeMap<String, f64>, Vec<(String, f64)>) {
        let rel_paths = collect_repo_files(repo_path);
        let mut files = Vec::with_capacity(rel_paths.len());
        let mut path_strings = Vec::with_capacity(rel_paths.len());
        for rel in &rel_paths {
            let path_str = rel.to_string_lossy().into_owned();
            let body = std::fs::read_to_string(repo_path.join(rel)).unwrap_or_default();
            files.push((path_str.clone(), body));
            path_strings.push(path_str);
        }
        (score_frameworks(&files), guess_module_paths(query, &path_strings))
    }
}

#[async_trait]
impl Handler for MapHandler {
    fn role(&self) -> &'static str {
        "map"
    }

    fn subject(&self) -> Subject {
        Subject::MappingRequest
    }

    async fn handle(&self, payload: &[u8]) -> Result<(), WorkerError> {
        let request: MappingRequest = decode(payload)?;

        let (framework_scores, module_suggestions) = match &request.repo_path {
            Some(repo_path) if Path::new(repo_path).is_dir() => {
                self.analyze_repo(&request.query, Path::new(repo_path))
            }
            Some(repo_path) => {
                warn!(repo_path, "repo path not available, skipping repo analysis");
                (BTreeMap::new(), Vec::new())
            }
            None => (BTreeMap::new(), Vec::new()),
        };

        let query_embedding = embed_checked(self.embedder.as_ref(), &request.query)
            .map_err(|err| WorkerError::Internal(err.to_string()))?;
        let hits = docs::search_chunks(
            &self.ctx.db,
            &request.project_id,
            &query_embedding,
            self.options.search_limit,
        )
        .await?;
        let similarities: Vec<f64> = hits.iter().map(|h| h.similarity).collect();

        let confidence = confidence_score(&framework_scores, &similarities);
        let framework_json = serde_json::to_value(&framework_scores)
            .map_err(|err| WorkerError::Internal(err.to_string()))?;
        let suggestions_json = serde_json::to_value(&module_suggestions)
            .map_err(|err| WorkerError::Internal(err.to_string()))?;
        let hits_json = serde_json::to_value(&hits)
            .map_err(|err| WorkerError::Internal(err.to_string()))?;

        mappings::complete_mapping(
            &self.ctx.db,
            &request.mapping_id,
            &framework_json,
            &suggestions_json,
            &hits_json,
            confidence,
        )
        .await?;

        let completed = MappingCompleted {
            mapping_id: request.mapping_id.clone(),
            report_id: request.report_id.clone(),
            framework_scores: framework_json,
            module_suggestions: suggestions_json,
            doc_results: hits_json,
        };
        self.bus
            .publish(Subject::MappingCompleted.as_str(), encode(&completed)?)
            .await?;

        info!(
            mapping_id = %request.mapping_id,
            confidence,
            doc_hits = similarities.len(),
            "mapping completed"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "map_tests.rs"]
mod tests;
