//! Error types for configuration store operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration store operations
pub type Result<T> = std::result::Result<T, ConfigStoreError>;

#[derive(Debug, Error)]
pub enum ConfigStoreError {
    /// Caller supplied a malformed extension, codec list or option set
    #[error("Validation error: {0}")]
    Validation(String),

    /// No endpoint record exists for the extension
    #[error("Extension {0} not found")]
    NotFound(String),

    /// A section exists but lacks a field or holds an unusable value
    #[error("Malformed section [{section}]: {message}")]
    Malformed { section: String, message: String },

    /// A backing file could not be parsed
    #[error("Parse error in {path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A backing file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigStoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigStoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the caller's input rather than the files on disk
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ConfigStoreError::Validation(_) | ConfigStoreError::NotFound(_)
        )
    }
}
