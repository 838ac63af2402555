// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process execution seam for the docker and tc CLIs.

use async_trait::async_trait;

use crate::EnvelopeError;

/// Captured output of one CLI invocation.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Run a program with arguments and capture its output.
#[async_trait]
pub trait Exec: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<ExecOutput, EnvelopeError>;
}

/// Production executor backed by `tokio::process`.
#[derive(Clone, Copy, Default)]
pub struct SystemExec;

#[async_trait]
impl Exec for SystemExec {
    async fn run(&self, program: &str, args: &[String]) -> Result<ExecOutput, EnvelopeError> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(ExecOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run and require exit code 0, mapping failure to a policy violation.
pub async fn run_checked(
    exec: &dyn Exec,
    program: &str,
    args: &[String],
) -> Result<ExecOutput, EnvelopeError> {
    let output = exec.run(program, args).await?;
    if !output.success() {
        return Err(EnvelopeError::Policy(format!(
            "{} {} exited {}: {}",
            program,
            args.join(" "),
            output.status,
            output.stderr.trim()
        )));
    }
    Ok(output)
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    //! Recording executor for tests.

    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records every invocation; responses are scripted by substring match
    /// over the joined command line.
    #[derive(Clone, Default)]
    pub struct FakeExec {
        calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
        scripted: Arc<Mutex<Vec<(String, ExecOutput)>>>,
    }

    impl FakeExec {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script the response for any invocation whose joined command line
        /// contains `needle`. Later scripts win over earlier ones.
        pub fn script(&self, needle: &str, output: ExecOutput) {
            self.scripted.lock().push((needle.to_string(), output));
        }

        /// Script a failure with the given status and stderr.
        pub fn script_failure(&self, needle: &str, status: i32, stderr: &str) {
            self.script(
                needle,
                ExecOutput { status, stdout: String::new(), stderr: stderr.to_string() },
            );
        }

        /// All recorded invocations as joined command lines, in order.
        pub fn command_lines(&self) -> Vec<String> {
            self.calls
                .lock()
                .iter()
                .map(|(p, args)| format!("{} {}", p, args.join(" ")))
                .collect()
        }
    }

    #[async_trait]
    impl Exec for FakeExec {
        async fn run(&self, program: &str, args: &[String]) -> Result<ExecOutput, EnvelopeError> {
            self.calls.lock().push((program.to_string(), args.to_vec()));
            let line = format!("{} {}", program, args.join(" "));
            let scripted = self.scripted.lock();
            for (needle, output) in scripted.iter().rev() {
                if line.contains(needle.as_str()) {
                    return Ok(output.clone());
                }
            }
            Ok(ExecOutput { status: 0, stdout: String::new(), stderr: String::new() })
        }
    }
}
