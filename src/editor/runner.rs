//! External command execution with a fail-fast contract.
//!
//! Every step of the update and save pipelines is a shell command run in the
//! content root. A nonzero exit always becomes [`EditorError::CommandFailed`];
//! callers rely on that to abort the pipeline.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{EditorError, Result};

/// Which output stream a command's text is captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Stdout,
    Stderr,
}

/// One command line to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub capture: Capture,
    /// Replaces the generated failure text when set.
    pub error_message: Option<String>,
}

impl Invocation {
    /// Capture stdout, the default for status-style commands.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            capture: Capture::Stdout,
            error_message: None,
        }
    }

    pub fn capture_stderr(mut self) -> Self {
        self.capture = Capture::Stderr;
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Build the failure for a nonzero exit.
    pub fn failure(&self, exit_code: i32, output: String) -> EditorError {
        let message = match &self.error_message {
            Some(text) => format!("Error: {}", text),
            None => format!(
                "Error at '{}': code {}, out {}",
                self.command, exit_code, output
            ),
        };
        EditorError::CommandFailed {
            command: self.command.clone(),
            exit_code,
            output,
            message,
        }
    }
}

/// Abstraction over command execution for testability.
/// Real implementation: `ShellRunner`. Test double: `MockRunner`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion; nonzero exit is an error carrying the captured text.
    async fn run(&self, invocation: &Invocation) -> Result<String>;

    /// Run a command only for its exit status. Output is discarded.
    async fn probe(&self, command: &str) -> Result<bool>;
}

/// Runs commands through `sh -c` inside the content root.
pub struct ShellRunner {
    work_dir: PathBuf,
}

impl ShellRunner {
    pub fn new(work_dir: impl AsRef<Path>) -> Self {
        Self {
            work_dir: work_dir.as_ref().to_path_buf(),
        }
    }

    fn shell(&self, command: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null());
        cmd
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, invocation: &Invocation) -> Result<String> {
        info!("Running command: {}", invocation.command);

        let mut cmd = self.shell(&invocation.command);
        match invocation.capture {
            Capture::Stdout => cmd.stdout(Stdio::piped()).stderr(Stdio::null()),
            Capture::Stderr => cmd.stdout(Stdio::null()).stderr(Stdio::piped()),
        };

        let output = cmd.output().await.map_err(|source| EditorError::Spawn {
            command: invocation.command.clone(),
            source,
        })?;

        let captured = match invocation.capture {
            Capture::Stdout => String::from_utf8_lossy(&output.stdout).into_owned(),
            Capture::Stderr => String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            return Err(invocation.failure(exit_code, captured));
        }

        Ok(captured)
    }

    async fn probe(&self, command: &str) -> Result<bool> {
        debug!("Probing: {}", command);
        let status = self
            .shell(command)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| EditorError::Spawn {
                command: command.to_string(),
                source,
            })?;
        Ok(status.success())
    }
}
