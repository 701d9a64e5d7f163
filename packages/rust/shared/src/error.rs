//! Error types for flowindex.
//!
//! Library crates use [`FlowIndexError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all flowindex operations.
#[derive(Debug, thiserror::Error)]
pub enum FlowIndexError {
    /// The workflow corpus root directory does not exist.
    #[error("workflow directory not found: {path:?}")]
    CorpusUnavailable { path: PathBuf },

    /// A definition file is not valid UTF-8 JSON.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// A definition decodes but lacks a usable workflow shape.
    #[error("analysis error: {message}")]
    Analysis { message: String },

    /// A write target already exists.
    #[error("target already exists: {path:?}")]
    Conflict { path: PathBuf },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Invalid caller input (unknown filter value, bad page number, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A requested workflow record does not exist.
    #[error("workflow not found: {0}")]
    NotFound(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FlowIndexError>;

impl FlowIndexError {
    /// Create a decode error from any displayable message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    /// Create an analysis error from any displayable message.
    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    /// Whether this error only concerns a single item of a batch.
    ///
    /// Batch operations record these and move on; anything else aborts the batch.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Analysis { .. } | Self::Conflict { .. } | Self::Io { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = FlowIndexError::analysis("`nodes` is not an array");
        assert_eq!(err.to_string(), "analysis error: `nodes` is not an array");

        let err = FlowIndexError::validation("unknown trigger filter 'Cron'");
        assert!(err.to_string().contains("'Cron'"));
    }

    #[test]
    fn per_file_classification() {
        assert!(FlowIndexError::decode("bad json").is_per_file());
        assert!(
            FlowIndexError::Conflict {
                path: "out/a.mmd".into()
            }
            .is_per_file()
        );
        assert!(!FlowIndexError::Storage("disk full".into()).is_per_file());
        assert!(
            !FlowIndexError::CorpusUnavailable {
                path: "workflows".into()
            }
            .is_per_file()
        );
    }
}
