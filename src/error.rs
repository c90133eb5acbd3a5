//! Error types and result aliases for docpipe.
//!
//! This module defines the error handling infrastructure:
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used by the binary and config loading
//! - [`HandlerError`]: Failure raised by a single stage of a format handler
//! - [`PipelineError`]: A [`HandlerError`] tagged with the stage and input that produced it

use std::path::PathBuf;

use anyhow::Result as AnyhowResult;
use thiserror::Error;

use crate::process::{Format, Stage};

pub type Result<T> = AnyhowResult<T>;

/// Errors raised by format handler stages.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Source missing or unreadable, or destination unwritable
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tabular reader or writer failure
    #[error("CSV error on '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Markup is not well-formed
    #[error("malformed markup in '{}': {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    /// Output would overwrite the file being processed
    #[error("output '{}' is the input file", path.display())]
    OutputIsInput { path: PathBuf },

    /// A stage ran before the tree it needs was read
    #[error("no document loaded")]
    MissingDocument,

    /// A stage ran before the records it needs were parsed
    #[error("no dataset parsed")]
    MissingDataset,
}

impl HandlerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn output_is_input(path: impl Into<PathBuf>) -> Self {
        Self::OutputIsInput { path: path.into() }
    }

    /// True for missing or unreadable sources
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// A handler failure with the pipeline position it happened at.
#[derive(Debug, Error)]
#[error("{format} pipeline failed at {stage} stage for '{}': {source}", input.display())]
pub struct PipelineError {
    pub stage: Stage,
    pub format: Format,
    pub input: PathBuf,
    #[source]
    pub source: HandlerError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_classification() {
        let err = HandlerError::io(
            "missing.csv",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());
        assert!(err.to_string().contains("missing.csv"));
    }

    #[test]
    fn test_csv_error_is_not_a_missing_source() {
        let inner = std::io::Error::from(std::io::ErrorKind::WriteZero);
        let err = HandlerError::csv("out.csv", csv::Error::from(inner));
        assert!(matches!(err, HandlerError::Csv { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_pipeline_error_message() {
        let err = PipelineError {
            stage: Stage::Save,
            format: Format::Hierarchical,
            input: PathBuf::from("doc.xml"),
            source: HandlerError::MissingDocument,
        };
        let msg = err.to_string();
        assert!(msg.contains("save"));
        assert!(msg.contains("XML"));
        assert!(msg.contains("doc.xml"));
    }
}
