//! Update and save pipelines.
//!
//! Both are linear sequences of external commands that abort on the first
//! failure:
//!
//! ```text
//! update: revert → clean → pull → apply pull → regenerate
//! save:   validate → write → modified? → pull → apply pull → regenerate → commit → [push]
//! ```
//!
//! A failed save leaves the written file modified but uncommitted; the next
//! successful save or update's revert step resolves it.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use super::locate::SourceReference;
use super::referer::extract_module_name;
use super::runner::{CommandRunner, Invocation};
use super::session::SessionContext;
use crate::config::EditorConfig;
use crate::errors::{EditorError, Result};
use crate::util::{normalize_line_endings, sanitize, shell_quote};

pub const DEFAULT_COMMIT_MESSAGE: &str = "Unnamed web commit";

/// Output format produced by a regeneration script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenKind {
    Html,
    Pdf,
}

impl fmt::Display for RegenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegenKind::Html => write!(f, "HTML"),
            RegenKind::Pdf => write!(f, "PDF"),
        }
    }
}

/// Fields submitted from the editor form.
#[derive(Debug, Clone, Default)]
pub struct SaveRequest {
    pub content: String,
    pub message: String,
    pub author: String,
}

pub struct Workflow {
    config: Arc<EditorConfig>,
    runner: Arc<dyn CommandRunner>,
}

impl Workflow {
    pub fn new(config: Arc<EditorConfig>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Module to scope regeneration to, when module scoping is enabled.
    pub fn module_for(&self, referer: Option<&str>) -> Option<String> {
        if !self.config.modules {
            return None;
        }
        referer.and_then(extract_module_name)
    }

    async fn run(&self, invocation: Invocation) -> Result<String> {
        self.runner.run(&invocation).await
    }

    /// Run the configured regeneration script, optionally for one module.
    pub async fn regenerate(&self, module: Option<&str>, kind: RegenKind) -> Result<()> {
        let script = match kind {
            RegenKind::Html => self.config.regen_script.as_deref(),
            RegenKind::Pdf => self.config.regen_pdf_script.as_deref(),
        }
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| EditorError::NoRegenScript {
            kind: kind.to_string(),
        })?;

        let mut command = script.to_string();
        if let Some(module) = module {
            command.push(' ');
            command.push_str(&shell_quote(module));
        }

        let started = Instant::now();
        self.run(Invocation::new(command).capture_stderr()).await?;
        info!("Generating took {} sec", started.elapsed().as_secs());
        Ok(())
    }

    async fn pull_and_apply(&self) -> Result<()> {
        let vcs = self.config.vcs;
        self.run(Invocation::new(vcs.pull())).await?;
        self.run(Invocation::new(vcs.apply_pull()).with_error_message("Update conflict"))
            .await
            .map_err(EditorError::into_conflict)?;
        Ok(())
    }

    /// Reset the working copy to the remote state and regenerate.
    pub async fn update(&self, module: Option<&str>, kind: RegenKind) -> Result<()> {
        info!("--- Do update");
        let vcs = self.config.vcs;
        self.run(Invocation::new(vcs.revert())).await?;
        self.run(Invocation::new(vcs.clean())).await?;
        self.pull_and_apply().await?;
        self.regenerate(module, kind).await
    }

    /// Discard uncommitted modifications.
    pub async fn cleanup(&self) -> Result<()> {
        info!("--- Do cleanup");
        self.run(Invocation::new(self.config.vcs.revert())).await?;
        Ok(())
    }

    /// Update; on failure revert best-effort and return the original error.
    pub async fn update_or_cleanup(&self, module: Option<&str>, kind: RegenKind) -> Result<()> {
        let Err(err) = self.update(module, kind).await else {
            return Ok(());
        };
        error!("Update failed: {}", err);
        if let Err(cleanup_err) = self.cleanup().await {
            warn!("Cleanup after failed update also failed: {}", cleanup_err);
        }
        Err(err)
    }

    /// Update only when the remote reports incoming changes.
    ///
    /// Returns whether an update ran. A failing probe counts as "no changes".
    pub async fn autoupdate(&self, module: Option<&str>, kind: RegenKind) -> Result<bool> {
        let incoming = match self.runner.probe(&self.config.vcs.incoming()).await {
            Ok(incoming) => incoming,
            Err(err) => {
                warn!("Incoming check failed: {}", err);
                false
            }
        };
        if !incoming {
            return Ok(false);
        }
        info!("Incoming changes, auto updating");
        self.update_or_cleanup(module, kind).await?;
        Ok(true)
    }

    /// Write, regenerate and commit an edited source file.
    pub async fn save(
        &self,
        source: &SourceReference,
        request: SaveRequest,
        module: Option<&str>,
        session: &mut SessionContext,
    ) -> Result<()> {
        info!("--- Do save");

        let message = match request.message.trim() {
            "" => DEFAULT_COMMIT_MESSAGE.to_string(),
            text => sanitize(text),
        };
        let author = match request.author.trim() {
            "" => return Err(EditorError::Validation("Please say your name".into())),
            name => sanitize(name),
        };
        session.author = Some(author.clone());

        let content = normalize_line_endings(&request.content);
        let path = self.config.doc_root.join(source.relative());
        info!("Writing to file {} {} bytes", path.display(), content.len());
        tokio::fs::write(&path, content.as_bytes())
            .await
            .map_err(|e| EditorError::io(&path, e))?;

        let vcs = self.config.vcs;
        let file = source.as_str();
        let status = self.run(Invocation::new(vcs.modified(&file))).await?;
        if status.trim().is_empty() {
            return Err(EditorError::Validation(
                "Nothing to commit and generate".into(),
            ));
        }

        self.pull_and_apply().await?;
        self.regenerate(module, RegenKind::Html).await?;
        self.run(Invocation::new(vcs.commit(&author, &message, &file)))
            .await?;

        if self.config.allow_push {
            self.run(Invocation::new(vcs.push())).await?;
        }

        info!("Succeeded, author {}, message {}", author, message);
        Ok(())
    }
}
