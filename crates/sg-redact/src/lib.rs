//! Structured redaction for safeguard.
//!
//! Domain objects are serialized to a `serde_json::Value` tree first; the
//! [`Redactor`] then masks the scalar value of every object entry whose key
//! is listed as sensitive, at any depth. Nested objects and arrays are
//! always descended into, and redaction itself never fails.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use sg_redact::{RedactionPolicy, Redactor};
//!
//! let redactor = Redactor::new(&RedactionPolicy::default()).unwrap();
//! let out = redactor.redact(&json!({"user": "bob", "password": "hunter2"}));
//! assert_eq!(out, json!({"user": "bob", "password": "**********"}));
//! ```

pub mod error;
pub mod policy;
pub mod redact;

pub use error::{PolicyError, Result};
pub use policy::{RedactionPolicy, DEFAULT_MASK, DEFAULT_SENSITIVE_KEY, POLICY_SCHEMA_VERSION};
pub use redact::Redactor;

use serde_json::Value;

/// Redact `tree` for the given keys with the default mask.
///
/// Empty keys are ignored.
pub fn redact(tree: &Value, sensitive_keys: &[&str]) -> Value {
    let keys = sensitive_keys.iter().filter(|k| !k.trim().is_empty()).copied();
    match Redactor::new(&RedactionPolicy::with_keys(keys)) {
        Ok(redactor) => redactor.redact(tree),
        // unreachable with filtered keys and the default schema version
        Err(_) => Value::String(DEFAULT_MASK.to_string()),
    }
}
