// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Export worker: deliver a validated repro as a PR, sandbox, docker tarball
//! or report.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use retrace_core::{ExportId, ExportRecord, ExportStatus, ExportType, Repro, ReproId};
use retrace_envelope::{Exec, SystemExec};
use retrace_runtime::{Bus, Handler, TempScope, WorkerContext, WorkerError};
use retrace_storage::{keys, repros};
use retrace_wire::{decode, encode, ExportCompleted, ExportRequest, Subject};

use crate::transforms::{GitHost, ReportRender, ReproReportData, SandboxHost};

/// Path the regression test lands at inside the target repo.
pub fn regression_test_path(repro_id: &ReproId) -> String {
    format!("tests/regressions/{}.spec.js", repro_id)
}

/// Branch name for PR exports, overridable via options.
pub fn default_branch_name(repro_id: &ReproId) -> String {
    format!("bug-repro-{}", repro_id)
}

/// The reproduction files shared by the sandbox and docker deliveries.
pub fn reproduction_files(data: &ReproReportData) -> Vec<(String, String)> {
    vec![
        ("package.json".to_string(), package_json(data)),
        ("playwright.config.js".to_string(), playwright_config()),
        (regression_test_path(&ReproId::new(data.repro_id.clone())), test_file(data)),
        ("README.md".to_string(), readme(data)),
    ]
}

pub fn test_file(data: &ReproReportData) -> String {
    format!(
        "const {{ test, expect }} = require('@playwright/test');\n\n\
         test('Regression: {}', async ({{ page }}) => {{\n\
         {}\n\
         }});\n",
        data.title.replace('\'', "\\'"),
        indent(&data.test_code, "  "),
    )
}

fn indent(code: &str, prefix: &str) -> String {
    code.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn package_json(data: &ReproReportData) -> String {
    serde_json::to_string_pretty(&serde_json::json!({
        "name": format!("bug-repro-{}", data.repro_id),
        "version": "1.0.0",
        "description": format!("Bug reproduction: {}", data.title),
        "scripts": {
            "test": "playwright test",
            "test:headed": "playwright test --headed",
        },
        "devDependencies": {
            "@playwright/test": "^1.40.0",
        },
    }))
    .unwrap_or_default()
}

fn playwright_config() -> String {
    "const { defineConfig } = require('@playwright/test');\n\n\
     module.exports = defineConfig({\n\
       testDir: './tests',\n\
       timeout: 30000,\n\
       use: {\n\
         headless: true,\n\
         viewport: { width: 1280, height: 720 },\n\
         video: 'on-first-retry',\n\
         screenshot: 'only-on-failure'\n\
       },\n\
     });\n"
        .to_string()
}

fn readme(data: &ReproReportData) -> String {
    format!(
        "# Bug Reproduction: {}\n\n\
         This is an automated reproduction of a bug report.\n\n\
         ## Description\n{}\n\n\
         ## Running the Test\n\
         ```bash\n\
         npm install\n\
         npm test\n\
         ```\n\n\
         ## Expected Behavior\n\
         The test should fail, reproducing the reported bug.\n\n\
         ## Reproduction ID\n{}\n",
        data.title, data.description, data.repro_id
    )
}

fn dockerfile(data: &ReproReportData) -> String {
    format!(
        "FROM mcr.microsoft.com/playwright:v1.40.0\n\n\
         WORKDIR /app\n\n\
         COPY package*.json ./\n\
         RUN npm ci\n\n\
         COPY . .\n\n\
         CMD [\"npm\", \"test\", \"{}\"]\n",
        regression_test_path(&ReproId::new(data.repro_id.clone()))
    )
}

fn compose() -> String {
    "services:\n  bug-repro:\n    build: .\n    environment:\n      - CI=true\n    volumes:\n      - ./test-results:/app/test-results\n".to_string()
}

/// PR body for the regression-test pull request.
pub fn pr_body(data: &ReproReportData) -> String {
    format!(
        "## Bug Reproduction\n\n\
         This PR adds a regression test for the bug: **{}**\n\n\
         ### Description\n{}\n\n\
         ### Test Details\n\
         - **Reproduction ID**: {}\n\
         - **Stability Score**: {}\n\
         - **Status**: {}\n\n\
         ### How to Verify\n\
         1. Run the test: `npm test {}`\n\
         2. The test should fail, reproducing the reported issue\n\
         3. Once the bug is fixed, this test should pass\n",
        data.title,
        data.description,
        data.repro_id,
        data.stability_score.map(|s| s.to_string()).unwrap_or_else(|| "N/A".to_string()),
        data.status,
        regression_test_path(&ReproId::new(data.repro_id.clone())),
    )
}

/// Delivery collaborators the export role is deployed with.
pub struct ExportTargets {
    pub git: Arc<dyn GitHost>,
    pub sandbox: Arc<dyn SandboxHost>,
    pub renderer: Arc<dyn ReportRender>,
}

pub struct ExportHandler {
    ctx: Arc<WorkerContext>,
    bus: Arc<dyn Bus>,
    targets: ExportTargets,
    exec: Arc<dyn Exec>,
}

impl ExportHandler {
    pub fn new(ctx: Arc<WorkerContext>, bus: Arc<dyn Bus>, targets: ExportTargets) -> Self {
        Self { ctx, bus, targets, exec: Arc::new(SystemExec) }
    }

    /// Substitute the CLI executor, used when archiving must be faked.
    pub fn with_exec(mut self, exec: Arc<dyn Exec>) -> Self {
        self.exec = exec;
        self
    }

    async fn report_data(&self, repro: &Repro) -> ReproReportData {
        let test_code = self
            .ctx
            .objects
            .get_bytes(&keys::generated_test_key(&repro.id, "test.spec.ts"))
            .await
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_else(|_| "// Test code not available".to_string());

        ReproReportData {
            repro_id: repro.id.to_string(),
            title: repro.title.clone().unwrap_or_else(|| "Generated reproduction".to_string()),
            description: repro.description.clone().unwrap_or_default(),
            status: repro.status.to_string(),
            stability_score: None,
            test_code,
        }
    }

    async fn export_pr(
        &self,
        data: &ReproReportData,
        options: &serde_json::Value,
    ) -> Result<serde_json::Value, WorkerError> {
        let repo_url = options
            .get("repo_url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| WorkerError::MalformedInput("pr export requires repo_url".into()))?;
        let repro_id = ReproId::new(data.repro_id.clone());
        let branch = options
            .get("branch_name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| default_branch_name(&repro_id));

        let test_path = regression_test_path(&repro_id);
        self.targets.git.create_branch(repo_url, &branch).await?;
        self.targets
            .git
            .commit_file(
                repo_url,
                &branch,
                &test_path,
                &test_file(data),
                &format!("Add regression test for {}", data.title),
            )
            .await?;
        let pr = self
            .targets
            .git
            .open_pull_request(
                repo_url,
                &branch,
                &format!("Add regression test: {}", data.title),
                &pr_body(data),
            )
            .await?;

        Ok(serde_json::json!({
            "pr": pr,
            "branch_name": branch,
            "test_path": test_path,
        }))
    }

    async fn export_sandbox(
        &self,
        data: &ReproReportData,
    ) -> Result<serde_json::Value, WorkerError> {
        let files = reproduction_files(data);
        self.targets
            .sandbox
            .create_sandbox(&format!("Bug Reproduction: {}", data.title), &files)
            .await
    }

    async fn export_docker(
        &self,
        data: &ReproReportData,
        export_id: &ExportId,
    ) -> Result<serde_json::Value, WorkerError> {
        let scope = self.ctx.temp_scope("export")?;
        let tree = scope
            .subdir("repro")
            .map_err(|err| WorkerError::Internal(err.to_string()))?;

        let mut files = reproduction_files(data);
        files.push(("Dockerfile".to_string(), dockerfile(data)));
        files.push(("docker-compose.yml".to_string(), compose()));
        for (path, content) in &files {
            let file_path = tree.join(path);
            if let Some(parent) = file_path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| WorkerError::Internal(err.to_string()))?;
            }
            tokio::fs::write(&file_path, content)
                .await
                .map_err(|err| WorkerError::Internal(err.to_string()))?;
        }

        let tarball = tarball_of(&scope, self.exec.as_ref(), &tree).await?;
        let repro_id = ReproId::new(data.repro_id.clone());
        let key = keys::export_key(&repro_id, export_id, "tar.gz");
        self.ctx.objects.put_file(&key, &tarball).await?;

        Ok(serde_json::json!({ "tarball_key": key, "files": files.len() }))
    }

    async fn export_report(
        &self,
        data: &ReproReportData,
        export_id: &ExportId,
        options: &serde_json::Value,
    ) -> Result<serde_json::Value, WorkerError> {
        let format = options.get("format").and_then(|v| v.as_str()).unwrap_or("pdf");
        let repro_id = ReproId::new(data.repro_id.clone());
        match format {
            "json" => {
                let report = serde_json::json!({
                    "reproduction": data,
                    "export_info": { "format": "json", "version": "1.0" },
                });
                let key = keys::export_key(&repro_id, export_id, "json");
                let body = serde_json::to_vec_pretty(&report)
                    .map_err(|err| WorkerError::Internal(err.to_string()))?;
                self.ctx.objects.put_bytes(&key, body).await?;
                Ok(serde_json::json!({ "report_key": key, "format": "json" }))
            }
            "pdf" => {
                let bytes = self.targets.renderer.render_pdf(data)?;
                let key = keys::export_key(&repro_id, export_id, "pdf");
                self.ctx.objects.put_bytes(&key, bytes).await?;
                Ok(serde_json::json!({ "report_key": key, "format": "pdf" }))
            }
            other => Err(WorkerError::MalformedInput(format!(
                "unsupported report format: {}",
                other
            ))),
        }
    }
}

/// Pack a tree into `repro.tar.gz` inside the scope via the tar CLI.
async fn tarball_of(
    scope: &TempScope,
    exec: &dyn Exec,
    tree: &std::path::Path,
) -> Result<std::path::PathBuf, WorkerError> {
    let tarball = scope.file("repro.tar.gz");
    let args: Vec<String> = vec![
        "czf".into(),
        tarball.to_string_lossy().into_owned(),
        "-C".into(),
        tree.to_string_lossy().into_owned(),
        ".".into(),
    ];
    let output = exec
        .run("tar", &args)
        .await
        .map_err(|err| WorkerError::Internal(err.to_string()))?;
    if !output.success() {
        return Err(WorkerError::Internal(format!(
            "tar exited {}: {}",
            output.status, output.stderr
        )));
    }
    Ok(tarball)
}

/// Stable export id per (repro, type): a redelivered export request converges
/// on the same row and artifact key.
pub fn export_id_for(repro_id: &ReproId, export_type: ExportType) -> ExportId {
    ExportId::new(format!("{}-{}", repro_id, export_type))
}

#[async_trait]
impl Handler for ExportHandler {
    fn role(&self) -> &'static str {
        "export"
    }

    fn subject(&self) -> Subject {
        Subject::ExportRequest
    }

    async fn handle(&self, payload: &[u8]) -> Result<(), WorkerError> {
        let request: ExportRequest = decode(payload)?;
        let repro = repros::fetch_repro(&self.ctx.db, &request.repro_id).await?;
        let data = self.report_data(&repro).await;
        let export_id = export_id_for(&request.repro_id, request.export_type);

        let outcome = match request.export_type {
            ExportType::Pr => self.export_pr(&data, &request.options).await,
            ExportType::Sandbox => self.export_sandbox(&data).await,
            ExportType::Docker => self.export_docker(&data, &export_id).await,
            ExportType::Report => {
                self.export_report(&data, &export_id, &request.options).await
            }
        };

        let (result, status) = match outcome {
            Ok(result) => (result, ExportStatus::Completed),
            Err(err) if err.disposition() == retrace_runtime::Disposition::Ack => {
                // Terminal delivery failure: record it and finish the
                // message; the status row is the user-visible surface.
                warn!(repro_id = %request.repro_id, error = %err, "export failed terminally");
                (serde_json::json!({ "error": err.to_string() }), ExportStatus::Failed)
            }
            Err(err) => return Err(err),
        };

        let record = ExportRecord {
            id: export_id.clone(),
            repro_id: request.repro_id.clone(),
            export_type: request.export_type,
            result: result.clone(),
            status,
        };
        repros::insert_export(&self.ctx.db, &record).await?;

        let completed = ExportCompleted {
            export_id,
            repro_id: request.repro_id.clone(),
            export_type: request.export_type,
            result,
        };
        self.bus
            .publish(Subject::ExportCompleted.as_str(), encode(&completed)?)
            .await?;

        info!(
            repro_id = %request.repro_id,
            export_type = %request.export_type,
            status = %status,
            "export recorded"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
