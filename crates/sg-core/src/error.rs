//! Error types for the sg-core CLI.

use crate::exit_codes::ExitCode;
use sg_redact::PolicyError;
use sg_validate::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Failures that stop a command before it can give a verdict.
#[derive(Error, Debug)]
pub enum CliError {
    /// No rules file given and none found in the search path.
    #[error("no rules file found; pass --rules, set SG_RULES, or install {0}")]
    NoRulesFile(String),

    /// Rules file failed to load or compile.
    #[error("rules: {0}")]
    Rules(#[from] ConfigError),

    /// Redaction policy failed to load.
    #[error("redaction policy: {0}")]
    Policy(#[from] PolicyError),

    /// Input document for `redact` is not JSON.
    #[error("input is not valid JSON: {0}")]
    InputJson(#[source] serde_json::Error),

    /// Reading input or writing output failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing a result failed.
    #[error("failed to serialize output: {0}")]
    Output(#[source] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Rules(ConfigError::Io { .. }) | CliError::Policy(PolicyError::Io { .. }) => {
                ExitCode::IoError
            }
            CliError::NoRulesFile(_)
            | CliError::Rules(_)
            | CliError::Policy(_)
            | CliError::InputJson(_) => ExitCode::ArgsError,
            CliError::Io { .. } => ExitCode::IoError,
            CliError::Output(_) => ExitCode::InternalError,
        }
    }

    /// Stable numeric error code, shared with the library error codes.
    pub fn code(&self) -> u32 {
        match self {
            CliError::NoRulesFile(_) => 80,
            CliError::Rules(e) => e.code(),
            CliError::Policy(e) => e.code(),
            CliError::InputJson(_) => 81,
            CliError::Io { .. } => 82,
            CliError::Output(_) => 83,
        }
    }
}
