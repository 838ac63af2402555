// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Isolated test container lifecycle over the docker CLI.
//!
//! Hardening applied to every container: read-only root filesystem, tmpfs
//! for the writable paths, all capabilities dropped except NET_BIND_SERVICE,
//! no-new-privileges, the configured resource caps, and the deterministic
//! environment markers.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use retrace_wire::TestConfig;

use crate::exec::{run_checked, Exec};
use crate::freeze::FAKE_TIME_ENV;
use crate::limits::{limit_args, tmpfs_size_mb};
use crate::EnvelopeError;

/// Echo-probe readiness timeout.
pub const READY_TIMEOUT_SECS: u64 = 30;

#[allow(clippy::unwrap_used)]
static PASS_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*tests?\s*passed").unwrap());
#[allow(clippy::unwrap_used)]
static FAIL_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*tests?\s*failed").unwrap());

/// A created container, referenced by name.
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    pub name: String,
}

impl ContainerHandle {
    /// Deterministic container name for a test id; replays reuse it, so a
    /// leaked container from a crashed attempt is replaced, not duplicated.
    pub fn name_for(test_id: &str) -> String {
        let safe: String = test_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .collect();
        format!("retrace-det-{}", safe)
    }

    /// `docker run` arguments for the hardened container.
    pub fn create_args(config: &TestConfig, fake_time: Option<&str>) -> Vec<String> {
        let name = Self::name_for(&config.test_id);
        let caps = &config.determinism.caps;
        let mut args: Vec<String> = vec![
            "run".into(),
            "--detach".into(),
            format!("--name={}", name),
            "--read-only".into(),
            format!("--tmpfs=/tmp:rw,noexec,nosuid,size={}m", tmpfs_size_mb(caps)),
            format!("--tmpfs=/app/tmp:rw,noexec,nosuid,size={}m", tmpfs_size_mb(caps).min(50)),
            "--cap-drop=ALL".into(),
            "--cap-add=NET_BIND_SERVICE".into(),
            "--security-opt=no-new-privileges:true".into(),
            "--env=DETERMINISTIC_MODE=true".into(),
            "--env=CI=true".into(),
        ];
        if let Some(fake_time) = fake_time {
            args.push(format!("--env={}={}", FAKE_TIME_ENV, fake_time));
        }
        if let Some(mount_dir) = &config.mount_dir {
            args.push(format!("--volume={}:/work", mount_dir));
            args.push("--workdir=/work".into());
        }
        if config.determinism.enable_resource_limits {
            args.extend(limit_args(caps));
        }
        args.push(config.base_image.clone());
        // Keep the container alive for exec probes and the test command.
        args.extend(["sleep".to_string(), "infinity".to_string()]);
        args
    }

    /// Create and start the container.
    pub async fn create(
        exec: &dyn Exec,
        config: &TestConfig,
        fake_time: Option<&str>,
    ) -> Result<Self, EnvelopeError> {
        let name = Self::name_for(&config.test_id);
        // Replace any leftover from a previous delivery of this test id.
        let _ = exec.run("docker", &["rm".into(), "-f".into(), name.clone()]).await;
        run_checked(exec, "docker", &Self::create_args(config, fake_time)).await?;
        Ok(Self { name })
    }

    /// Poll the in-container echo probe until it answers or the timeout
    /// elapses.
    pub async fn wait_ready(&self, exec: &dyn Exec) -> Result<(), EnvelopeError> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(READY_TIMEOUT_SECS);
        loop {
            let probe = exec
                .run(
                    "docker",
                    &["exec".into(), self.name.clone(), "echo".into(), "ready".into()],
                )
                .await?;
            if probe.success() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(EnvelopeError::ReadyTimeout(READY_TIMEOUT_SECS));
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    /// Run the test command inside the container and parse its outcome.
    pub async fn exec_test(
        &self,
        exec: &dyn Exec,
        config: &TestConfig,
    ) -> Result<TestOutcome, EnvelopeError> {
        let mut args: Vec<String> = vec![
            "exec".into(),
            "--env=CI=true".into(),
            "--env=DETERMINISTIC=true".into(),
            self.name.clone(),
            "sh".into(),
            "-c".into(),
            config.test_command.clone(),
        ];
        if let Some(script) = &config.test_script {
            // The script is staged through the writable tmpfs.
            args = vec![
                "exec".into(),
                self.name.clone(),
                "sh".into(),
                "-c".into(),
                format!("cat > /tmp/test-entry <<'EOF'\n{}\nEOF", script),
            ];
            exec.run("docker", &args).await?;
            args = vec![
                "exec".into(),
                "--env=CI=true".into(),
                "--env=DETERMINISTIC=true".into(),
                self.name.clone(),
                "sh".into(),
                "-c".into(),
                config.test_command.clone(),
            ];
        }
        let output = exec.run("docker", &args).await?;
        Ok(parse_test_output(output.status, &format!("{}{}", output.stdout, output.stderr)))
    }

    /// Stop and remove; called on every exit path.
    pub async fn stop_remove(&self, exec: &dyn Exec) -> Result<(), EnvelopeError> {
        let stop = exec
            .run("docker", &["stop".into(), "--time=10".into(), self.name.clone()])
            .await?;
        if !stop.success() {
            tracing::warn!(container = %self.name, "container stop failed, forcing removal");
        }
        run_checked(exec, "docker", &["rm".into(), "-f".into(), self.name.clone()]).await?;
        Ok(())
    }
}

/// Parsed outcome of the in-container test command.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TestOutcome {
    pub passed: bool,
    pub exit_code: i32,
    pub tests_passed: u32,
    pub tests_failed: u32,
    pub output: String,
}

/// Token-scan the test runner output; the exit code decides when the output
/// is ambiguous.
pub fn parse_test_output(exit_code: i32, output: &str) -> TestOutcome {
    let lower = output.to_lowercase();
    let mut saw_pass = false;
    let mut saw_fail = false;
    for line in lower.lines() {
        if line.contains("passed") || line.contains('✓') {
            saw_pass = true;
        }
        if line.contains("failed") || line.contains('✗') || line.contains("error") {
            saw_fail = true;
        }
    }

    let tests_passed = PASS_COUNT
        .captures(&lower)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);
    let tests_failed = FAIL_COUNT
        .captures(&lower)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);

    let passed = if saw_pass || saw_fail {
        saw_pass && !saw_fail
    } else {
        exit_code == 0
    };

    TestOutcome {
        passed: passed && exit_code == 0,
        exit_code,
        tests_passed,
        tests_failed,
        output: output.to_string(),
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
