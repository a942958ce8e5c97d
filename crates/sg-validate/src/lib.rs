//! Input validation and canonicalization for untrusted input.
//!
//! This crate judges strings, directory paths and redirect targets coming
//! from untrusted callers before the application uses them.
//!
//! # Key Features
//!
//! - **Canonicalization**: one layer of each configured encoding is decoded;
//!   multiply or mixed encoded input is rejected as ambiguous.
//! - **Pattern rules**: per-type whitelist and blacklist regexes, fully
//!   anchored and compiled once when the registry is built.
//! - **Directory containment**: a path is accepted only if it already is the
//!   canonical path of a directory strictly inside a given parent.
//! - **Redirect checks**: absolute http(s) targets on an allowed origin only.
//! - **Split messages**: every rejection has a public message that is safe to
//!   return and an audit message with the raw input for internal logs.
//!
//! # Example
//!
//! ```no_run
//! use sg_validate::{RuleRegistry, Validator};
//!
//! let registry = RuleRegistry::load("/etc/safeguard/rules.json").unwrap();
//! let validator = Validator::new(registry);
//!
//! match validator.get_valid_input("signup.username", "alice", "Username", 32, false) {
//!     Ok(value) => println!("accepted: {value:?}"),
//!     Err(rejection) => eprintln!("{rejection}"),
//! }
//! ```

pub mod canonicalize;
pub mod engine;
pub mod error;
pub mod path;
pub mod redirect;
pub mod registry;
pub mod rejection;
pub mod rule;

pub use canonicalize::{
    Canonicalizer, Codec, EncodingError, HtmlEntityCodec, PercentCodec, CANONICALIZATION_VERSION,
};
pub use engine::{sanitize_alphanumeric, Validator};
pub use error::{ConfigError, Result};
pub use path::{is_proper_descendant, MAX_DIRECTORY_NAME_LENGTH};
pub use redirect::{Origin, RedirectConfig, RedirectPolicy, MAX_REDIRECT_LENGTH};
pub use registry::{RuleRegistry, RulesConfig, TypeSpec, DIRECTORY_NAME_TYPE, RULES_SCHEMA_VERSION};
pub use rejection::{LengthBound, Rejection, RejectionKind, Validated};
pub use rule::{CompiledPattern, PatternRule, PatternRuleBuilder};
