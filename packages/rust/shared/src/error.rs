//! Error types for qbank.
//!
//! Library crates use [`QbankError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all pipeline stages.
#[derive(Debug, thiserror::Error)]
pub enum QbankError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A required input file or directory does not exist.
    #[error("missing input: {}", path.display())]
    MissingInput { path: PathBuf },

    /// A selection resolved to nothing the consumer can use.
    #[error("empty result: {message}")]
    EmptyResult { message: String },

    /// Structured input could not be parsed as a whole.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (item shape, rule definition, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// JSON/TOML serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QbankError>;

impl QbankError {
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

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an empty-result error from any displayable message.
    pub fn empty(msg: impl Into<String>) -> Self {
        Self::EmptyResult {
            message: msg.into(),
        }
    }

    /// Report a required input that is absent.
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput { path: path.into() }
    }

    /// Wrap a `std::io::Error` with a path for context.
    ///
    /// `NotFound` is mapped to [`QbankError::MissingInput`] so callers get
    /// the same error whether they checked existence first or not.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::MissingInput { path };
        }
        Self::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = QbankError::config("max_len must be positive");
        assert_eq!(err.to_string(), "config error: max_len must be positive");

        let err = QbankError::missing("data/qbank/practice_m6.jsonl");
        assert_eq!(
            err.to_string(),
            "missing input: data/qbank/practice_m6.jsonl"
        );
    }

    #[test]
    fn io_not_found_becomes_missing_input() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = QbankError::io("index.csv", source);
        assert!(matches!(err, QbankError::MissingInput { .. }));

        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = QbankError::io("index.csv", source);
        assert!(matches!(err, QbankError::Io { .. }));
    }
}
