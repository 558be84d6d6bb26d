//! Error types for Blogsmith.
//!
//! Library crates use [`BlogsmithError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Stage agents and providers never hand these errors to the orchestrator:
//! they are folded into a degraded [`StageOutput`](crate::StageOutput) or an
//! error record at the boundary. Only validation and I/O errors (and strict
//! mode aborts) travel further.

use std::path::PathBuf;

use crate::types::FailureKind;

/// Top-level error type for all Blogsmith operations.
#[derive(Debug, thiserror::Error)]
pub enum BlogsmithError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A required credential (API key, token) is absent from the environment.
    #[error("{name} missing")]
    MissingCredential { name: String },

    /// Network/HTTP error talking to a completion service or provider.
    #[error("network error: {0}")]
    Network(String),

    /// Response body or model output could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Caller misuse (bad seeds, unsupported location, malformed brief).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A stage degraded while the run was in strict mode.
    #[error("stage {stage} failed: {message}")]
    Stage { stage: String, message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BlogsmithError>;

impl BlogsmithError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a missing-credential error for a human-readable credential name.
    pub fn missing_credential(name: impl Into<String>) -> Self {
        Self::MissingCredential { name: name.into() }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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

    /// Classify this error for a degraded stage output.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::MissingCredential { .. } | Self::Config { .. } => FailureKind::CredentialMissing,
            Self::Parse { .. } => FailureKind::MalformedResponse,
            _ => FailureKind::Transport,
        }
    }
}
