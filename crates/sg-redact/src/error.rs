//! Error types for redaction policy loading.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors that make a redaction policy unusable.
///
/// Redaction itself never fails; only building a [`crate::Redactor`] can.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// A sensitive key is empty or only whitespace.
    #[error("sensitive key list contains an empty key")]
    EmptyKey,

    /// Policy file uses a schema version this build does not understand.
    #[error("policy schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    /// I/O error reading a policy file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Policy file is not valid JSON for the expected shape.
    #[error("invalid JSON in policy file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PolicyError {
    /// Stable error code for structured reporting.
    pub fn code(&self) -> u32 {
        match self {
            PolicyError::EmptyKey => 70,
            PolicyError::VersionMismatch { .. } => 71,
            PolicyError::Io { .. } => 72,
            PolicyError::Parse { .. } => 73,
        }
    }
}
