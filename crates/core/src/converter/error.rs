//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Longest engine diagnostic excerpt carried in error messages.
const STDERR_EXCERPT_LIMIT: usize = 500;

/// Errors that can occur while rendering a document.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// LibreOffice binary not found.
    #[error("soffice not found at path: {path}")]
    SofficeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The engine exceeded its wall-clock deadline and was killed.
    #[error("conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The engine exited reporting an error.
    #[error("conversion failed: {reason}")]
    RenderFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The engine exited cleanly but produced no output file.
    #[error("engine produced no output: {path}")]
    OutputMissing { path: PathBuf },

    /// The rendered document has no pages.
    #[error("document has no pages")]
    EmptyDocument,

    /// Splitting the rendered document into pages failed.
    #[error("failed to split document: {reason}")]
    SplitFailed { reason: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a render-failed error, truncating the engine diagnostic.
    pub fn render_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::RenderFailed {
            reason: reason.into(),
            stderr: stderr.map(|s| truncate_excerpt(&s)),
        }
    }

    /// Creates a split-failed error.
    pub fn split_failed(reason: impl Into<String>) -> Self {
        Self::SplitFailed {
            reason: reason.into(),
        }
    }

    /// One-line description including the diagnostic excerpt, suitable for
    /// failure manifests.
    pub fn detail(&self) -> String {
        match self {
            Self::RenderFailed {
                reason,
                stderr: Some(stderr),
            } => format!("{}: {}", reason, stderr),
            other => other.to_string(),
        }
    }
}

fn truncate_excerpt(s: &str) -> String {
    if s.len() <= STDERR_EXCERPT_LIMIT {
        return s.to_string();
    }
    let mut end = STDERR_EXCERPT_LIMIT;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
