//! Error types for MinerLedger.
//!
//! Library crates use [`MinerLedgerError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all MinerLedger operations.
#[derive(Debug, thiserror::Error)]
pub enum MinerLedgerError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Markup parsing or field extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Workbook or backup storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (column mismatch, invalid value, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MinerLedgerError>;

impl MinerLedgerError {
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

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = MinerLedgerError::config("missing ledger path");
        assert_eq!(err.to_string(), "config error: missing ledger path");

        let err = MinerLedgerError::validation("column `Power` not found");
        assert!(err.to_string().contains("`Power`"));

        let err = MinerLedgerError::Storage("sheet locked".into());
        assert_eq!(err.to_string(), "storage error: sheet locked");
    }

    #[test]
    fn io_error_carries_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = MinerLedgerError::io("/tmp/ledger.xlsx", source);
        let msg = err.to_string();
        assert!(msg.contains("ledger.xlsx"));
        assert!(msg.contains("gone"));
    }
}
