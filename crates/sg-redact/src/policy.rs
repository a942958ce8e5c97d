//! Redaction policy configuration.

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Schema version for the policy file.
pub const POLICY_SCHEMA_VERSION: &str = "1.0.0";

/// Replacement written over sensitive scalars.
pub const DEFAULT_MASK: &str = "**********";

/// Key masked when no policy is configured.
pub const DEFAULT_SENSITIVE_KEY: &str = "password";

/// Which object keys hold sensitive values and what replaces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionPolicy {
    /// Schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Object keys whose scalar values are masked.
    #[serde(default = "default_sensitive_keys")]
    pub sensitive_keys: Vec<String>,

    /// Replacement string.
    #[serde(default = "default_mask")]
    pub mask: String,

    /// Match keys ignoring ASCII and Unicode case.
    #[serde(default)]
    pub case_insensitive: bool,
}

fn default_schema_version() -> String {
    POLICY_SCHEMA_VERSION.to_string()
}

fn default_sensitive_keys() -> Vec<String> {
    vec![DEFAULT_SENSITIVE_KEY.to_string()]
}

fn default_mask() -> String {
    DEFAULT_MASK.to_string()
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            sensitive_keys: default_sensitive_keys(),
            mask: default_mask(),
            case_insensitive: false,
        }
    }
}

impl RedactionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy masking exactly `keys` with the default mask.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sensitive_keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn mask(mut self, mask: impl Into<String>) -> Self {
        self.mask = mask.into();
        self
    }

    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    /// Load policy from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let policy: RedactionPolicy =
            serde_json::from_str(&content).map_err(|source| PolicyError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        policy.check()?;
        Ok(policy)
    }

    /// Reject policies that cannot be applied as written.
    pub fn check(&self) -> Result<()> {
        if self.schema_version != POLICY_SCHEMA_VERSION {
            return Err(PolicyError::VersionMismatch {
                expected: POLICY_SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }
        if self.sensitive_keys.iter().any(|k| k.trim().is_empty()) {
            return Err(PolicyError::EmptyKey);
        }
        Ok(())
    }
}
