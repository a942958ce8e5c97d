//! Exit codes for the sg-core CLI.
//!
//! Exit code ranges:
//! - 0-1: verdict on the input (accepted / rejected)
//! - 10-19: user or configuration errors, fixable by the caller
//! - 20-29: internal and I/O errors

/// Exit codes for sg-core operations.
///
/// These codes are a stable contract for scripts calling the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Input accepted (or command succeeded).
    Accepted = 0,

    /// Input rejected.
    Rejected = 1,

    /// Invalid arguments, missing or invalid configuration.
    ArgsError = 10,

    /// Internal error (bug).
    InternalError = 20,

    /// I/O error reading input or writing output.
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// True for the two verdict codes.
    pub fn is_verdict(self) -> bool {
        (self as i32) < 10
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Name used in JSON error output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Accepted => "OK_ACCEPTED",
            ExitCode::Rejected => "REJECTED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
