//! Typed error hierarchy for the editor.
//!
//! A single `EditorError` enum covers the locator, the command runner and the
//! workflow pipelines. Handlers classify failures with [`EditorError::kind`]
//! and show users only [`EditorError::notice_text`]; the full text goes to
//! the log.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::{first_line, sanitize};

/// Coarse classification of failures, used by handlers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AmbiguousSource,
    Validation,
    CommandFailed,
    Conflict,
    Internal,
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Source '{name}' is not unique, cannot decide")]
    AmbiguousSource { name: String },

    #[error("{0}")]
    Validation(String),

    /// `message` is the full user-facing text (override or auto-generated).
    #[error("{message}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
        message: String,
    },

    #[error("{message}")]
    Conflict { command: String, message: String },

    #[error("Cannot find script for type {kind}")]
    NoRegenScript { kind: String },

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;

impl EditorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditorError::NotFound { .. } => ErrorKind::NotFound,
            EditorError::AmbiguousSource { .. } => ErrorKind::AmbiguousSource,
            EditorError::Validation(_) => ErrorKind::Validation,
            EditorError::CommandFailed { .. } => ErrorKind::CommandFailed,
            EditorError::Conflict { .. } => ErrorKind::Conflict,
            EditorError::NoRegenScript { .. }
            | EditorError::Spawn { .. }
            | EditorError::Io { .. } => ErrorKind::Internal,
        }
    }

    /// Single escaped line suitable for a UI notice.
    pub fn notice_text(&self) -> String {
        sanitize(first_line(&self.to_string()))
    }

    /// Reclassify a failed merge/update step as a conflict.
    pub fn into_conflict(self) -> Self {
        match self {
            EditorError::CommandFailed {
                command, message, ..
            } => EditorError::Conflict { command, message },
            other => other,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EditorError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(message: &str) -> EditorError {
        EditorError::CommandFailed {
            command: "hg update".into(),
            exit_code: 1,
            output: "merging a.rst\nconflict".into(),
            message: message.into(),
        }
    }

    #[test]
    fn test_command_failed_carries_exit_code_and_output() {
        match failed("Error: boom") {
            EditorError::CommandFailed {
                exit_code, output, ..
            } => {
                assert_eq!(exit_code, 1);
                assert!(output.contains("conflict"));
            }
            _ => panic!("Expected CommandFailed"),
        }
    }

    #[test]
    fn test_into_conflict_keeps_command_and_message() {
        let err = failed("Error: Update conflict").into_conflict();
        match &err {
            EditorError::Conflict { command, message } => {
                assert_eq!(command, "hg update");
                assert_eq!(message, "Error: Update conflict");
            }
            _ => panic!("Expected Conflict"),
        }
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_into_conflict_leaves_other_errors_alone() {
        let err = EditorError::Validation("Please say your name".into()).into_conflict();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_notice_text_is_first_line_and_escaped() {
        let err = failed("Error at '<b>x</b>': code 1\nsecond line");
        assert_eq!(err.notice_text(), "Error at '&lt;b&gt;x&lt;/b&gt;': code 1");
    }

    #[test]
    fn test_ambiguous_source_names_the_file() {
        let err = EditorError::AmbiguousSource {
            name: "index.rst".into(),
        };
        assert!(err.to_string().contains("index.rst"));
        assert_eq!(err.kind(), ErrorKind::AmbiguousSource);
    }

    #[test]
    fn test_internal_variants_classify_as_internal() {
        let err = EditorError::NoRegenScript { kind: "PDF".into() };
        assert_eq!(err.kind(), ErrorKind::Internal);
        let err = EditorError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
