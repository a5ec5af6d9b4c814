//! Error types for orgdocs.
//!
//! Library crates use [`OrgDocsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::{ArtifactKind, DiscoveredArtifact};

/// Top-level error type for all orgdocs operations.
#[derive(Debug, thiserror::Error)]
pub enum OrgDocsError {
    /// The requested prompt template is not in the registry.
    #[error("unknown prompt template: {0}")]
    UnknownTemplate(String),

    /// One or more required template variables are absent or empty.
    #[error("missing variables for prompt template {template}: {}", names.join(", "))]
    MissingVariables {
        template: String,
        names: Vec<String>,
    },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Structured markup or project descriptor could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A glob pattern failed to compile.
    #[error("invalid glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// One or more package roots failed to scan.
    ///
    /// Artifacts found under the roots that did scan cleanly are kept in
    /// `recovered`, already sorted.
    #[error("{kind} discovery failed for {} root(s): {}", failures.len(), format_failures(failures))]
    Discovery {
        kind: ArtifactKind,
        failures: Vec<RootFailure>,
        recovered: Vec<DiscoveredArtifact>,
    },
}

/// A package root whose scan did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFailure {
    pub root: PathBuf,
    pub message: String,
}

fn format_failures(failures: &[RootFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.root.display(), f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OrgDocsError>;

impl OrgDocsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
