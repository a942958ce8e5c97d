//! safeguard core: the glue around the validation and redaction crates.
//!
//! Provides logging setup, configuration discovery, audit routing and the
//! exit-code contract used by the `sg-core` binary.

pub mod audit;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod output;

pub use error::{CliError, Result};
pub use exit_codes::ExitCode;
