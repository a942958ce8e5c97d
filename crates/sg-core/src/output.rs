//! Command payloads written to stdout.

use crate::error::CliError;
use crate::exit_codes::ExitCode;
use serde::Serialize;
use sg_validate::{Rejection, Validated};

/// Output format for command payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON document per invocation.
    #[default]
    Json,
    /// Single human-readable line.
    Summary,
}

/// Result of validating one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Verdict {
    Accepted {
        /// Canonical value; `null` for an allowed empty input.
        value: Option<String>,
    },
    Rejected {
        kind: &'static str,
        code: u32,
        /// Public message only.
        message: String,
    },
}

impl Verdict {
    pub fn from_validated<T: ToString>(result: &Validated<T>) -> Self {
        match result {
            Ok(value) => Verdict::Accepted {
                value: value.as_ref().map(ToString::to_string),
            },
            Err(rejection) => Verdict::rejected(rejection),
        }
    }

    fn rejected(rejection: &Rejection) -> Self {
        Verdict::Rejected {
            kind: rejection.kind().name(),
            code: rejection.kind().code(),
            message: rejection.public_message().to_string(),
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Verdict::Accepted { .. } => ExitCode::Accepted,
            Verdict::Rejected { .. } => ExitCode::Rejected,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, CliError> {
        match format {
            OutputFormat::Json => serde_json::to_string(self).map_err(CliError::Output),
            OutputFormat::Summary => Ok(match self {
                Verdict::Accepted { value: Some(v) } => format!("accepted: {v}"),
                Verdict::Accepted { value: None } => "accepted: (empty)".to_string(),
                Verdict::Rejected { kind, message, .. } => format!("rejected [{kind}]: {message}"),
            }),
        }
    }
}

/// Error payload, written to stderr.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub status: &'static str,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: u32,
    pub exit: &'static str,
    pub message: String,
}

impl ErrorReport {
    pub fn new(error: &CliError) -> Self {
        Self {
            status: "error",
            error: ErrorDetail {
                code: error.code(),
                exit: error.exit_code().code_name(),
                message: error.to_string(),
            },
        }
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => serde_json::to_string(self)
                .unwrap_or_else(|_| format!("error: {}", self.error.message)),
            OutputFormat::Summary => format!("error: {}", self.error.message),
        }
    }
}
