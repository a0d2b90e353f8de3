//! Subprocess seam for the external tools
//!
//! Everything that shells out goes through [`CommandRunner`], so the
//! pipeline can be driven by a scripted runner in tests.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command as TokioCommand;
use tracing::debug;

/// A program and its argv, never passed through a shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Shell-quoted rendering for logs and error context
    pub fn display(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{0} not found in PATH")]
    NotFound(String),

    #[error("Process spawn failed: {0}")]
    Spawn(String),

    #[error("Timeout exceeded after {0:?}")]
    Timeout(Duration),
}

/// Executes one command with a bounded timeout. Single attempt, no retries.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandLine, timeout: Duration) -> Result<RunOutput, RunError>;
}

/// Runs real processes with `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine, timeout: Duration) -> Result<RunOutput, RunError> {
        debug!("Executing: {}", command.display());
        let started = Instant::now();

        let child = TokioCommand::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(timeout, child)
            .await
            .map_err(|_| RunError::Timeout(timeout))?
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => RunError::NotFound(command.program.clone()),
                _ => RunError::Spawn(e.to_string()),
            })?;

        // Killed by a signal has no code
        let exit_code = output.status.code().unwrap_or(-1);
        debug!(
            "{} exited with {} after {:?}",
            command.program,
            exit_code,
            started.elapsed()
        );

        Ok(RunOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        })
    }
}
