//! Configuration errors for the validation engine.
//!
//! These are raised while building rules or loading a rules file, before any
//! input is judged. Rejections of untrusted input are a different type, see
//! [`crate::rejection`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type for rule construction and registry loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that make a rule or registry unusable.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A rule was built without any whitelist pattern.
    #[error("rule '{type_name}' has no whitelist pattern")]
    EmptyWhitelist { type_name: String },

    /// A whitelist or blacklist pattern failed to compile.
    #[error("rule '{type_name}': invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        type_name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A pattern string is larger than the engine accepts.
    #[error("rule '{type_name}': pattern length {len} exceeds maximum {max}")]
    PatternTooLong {
        type_name: String,
        len: usize,
        max: usize,
    },

    /// `min_length` is greater than `max_length`.
    #[error("rule '{type_name}': min_length {min} is greater than max_length {max}")]
    InvalidLengthBounds {
        type_name: String,
        min: usize,
        max: usize,
    },

    /// A type name is empty or contains characters outside `[A-Za-z0-9_.-]`.
    #[error("invalid type name {0:?}")]
    InvalidTypeName(String),

    /// The same type name was registered twice.
    #[error("duplicate type name {0:?}")]
    DuplicateType(String),

    /// Rules file uses a schema version this build does not understand.
    #[error("rules schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    /// Redirect policy origin could not be parsed.
    #[error("invalid redirect origin {0:?}")]
    InvalidOrigin(String),

    /// I/O error while reading a rules file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rules file is not valid JSON for the expected shape.
    #[error("invalid JSON in rules file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Stable error code for structured reporting.
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::EmptyWhitelist { .. } => 60,
            ConfigError::InvalidPattern { .. } => 61,
            ConfigError::PatternTooLong { .. } => 62,
            ConfigError::InvalidLengthBounds { .. } => 63,
            ConfigError::InvalidTypeName(_) => 64,
            ConfigError::VersionMismatch { .. } => 65,
            ConfigError::InvalidOrigin(_) => 66,
            ConfigError::Io { .. } => 67,
            ConfigError::Parse { .. } => 68,
            ConfigError::DuplicateType(_) => 69,
        }
    }
}
