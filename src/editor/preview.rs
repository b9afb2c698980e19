//! Live preview: source markup in, HTML out, via an external converter.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{EditorError, Result};

/// Result of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Html(String),
    /// Converter exited nonzero; carries its stderr.
    Rejected(String),
}

/// Pipes the source to `command` on stdin and reads HTML from stdout.
pub struct Converter {
    command: String,
    work_dir: PathBuf,
}

impl Converter {
    pub fn new(command: impl Into<String>, work_dir: impl AsRef<Path>) -> Self {
        Self {
            command: command.into(),
            work_dir: work_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn convert(&self, source: &[u8]) -> Result<Rendered> {
        info!("Got preview call {}", source.len());

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.work_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EditorError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // Feed stdin while stdout drains; filters write before reading all input.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin
                && let Err(e) = stdin.write_all(source).await
            {
                debug!("Converter stdin closed early: {}", e);
            }
        };
        let ((), output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|source| EditorError::Spawn {
            command: self.command.clone(),
            source,
        })?;

        if output.status.success() {
            Ok(Rendered::Html(
                String::from_utf8_lossy(&output.stdout).into_owned(),
            ))
        } else {
            Ok(Rendered::Rejected(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ))
        }
    }
}
