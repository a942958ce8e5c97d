//! Rule registry and rules file.
//!
//! A registry maps semantic type names (e.g. `Email`, `DirectoryName`) to
//! compiled [`PatternRule`] templates. It is built once, compiled eagerly,
//! and then shared read-only; there is no process-wide dictionary.

use crate::error::{ConfigError, Result};
use crate::redirect::RedirectConfig;
use crate::rule::PatternRule;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Schema version for the rules file.
pub const RULES_SCHEMA_VERSION: &str = "1.0.0";

/// Type used to validate canonical directory paths.
pub const DIRECTORY_NAME_TYPE: &str = "DirectoryName";

static RE_TYPE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]{1,128}$").unwrap());

/// On-disk rules file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Rule definitions keyed by type name.
    #[serde(default)]
    pub types: BTreeMap<String, TypeSpec>,

    /// Redirect origins, if redirects are validated at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectConfig>,
}

fn default_schema_version() -> String {
    RULES_SCHEMA_VERSION.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            types: BTreeMap::new(),
            redirect: None,
        }
    }
}

impl RulesConfig {
    /// Read and parse a rules file. Rules are not compiled here.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse rules from a JSON string.
    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

/// One type definition in the rules file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSpec {
    pub whitelist: Vec<String>,

    #[serde(default)]
    pub blacklist: Vec<String>,

    #[serde(default)]
    pub min_length: usize,

    /// Unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default = "default_true")]
    pub canonicalize: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TypeSpec {
    pub fn new(whitelist: impl Into<String>) -> Self {
        Self {
            whitelist: vec![whitelist.into()],
            blacklist: Vec::new(),
            min_length: 0,
            max_length: None,
            canonicalize: true,
            description: None,
        }
    }

    /// Compile this definition into a rule.
    pub fn compile(&self, type_name: &str) -> Result<PatternRule> {
        let mut builder = PatternRule::builder(type_name)
            .min_length(self.min_length)
            .canonicalize(self.canonicalize);
        if let Some(max) = self.max_length {
            builder = builder.max_length(max);
        }
        for pattern in &self.whitelist {
            builder = builder.whitelist(pattern.clone());
        }
        for pattern in &self.blacklist {
            builder = builder.blacklist(pattern.clone());
        }
        builder.build()
    }
}

/// Compiled rule templates keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, PatternRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every type in `config`. Fails on the first bad definition.
    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        if config.schema_version != RULES_SCHEMA_VERSION {
            return Err(ConfigError::VersionMismatch {
                expected: RULES_SCHEMA_VERSION.to_string(),
                actual: config.schema_version.clone(),
            });
        }

        let mut registry = Self::new();
        for (name, spec) in &config.types {
            validate_type_name(name)?;
            registry.register(spec.compile(name)?)?;
        }
        tracing::debug!(types = registry.len(), "rule registry built");
        Ok(registry)
    }

    /// Load and compile a rules file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_config(&RulesConfig::load(path)?)
    }

    /// Add a compiled rule under its own type name.
    pub fn register(&mut self, rule: PatternRule) -> Result<()> {
        let name = rule.type_name().to_string();
        validate_type_name(&name)?;
        if self.rules.contains_key(&name) {
            return Err(ConfigError::DuplicateType(name));
        }
        self.rules.insert(name, rule);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<&PatternRule> {
        self.rules.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.rules.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn validate_type_name(name: &str) -> Result<()> {
    if RE_TYPE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidTypeName(name.to_string()))
    }
}
