//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variable → config dir
//! environment variable → XDG config dir → `/etc/safeguard` → built-in.
//! An explicitly given path is used even if it does not exist, so that a
//! typo surfaces as a load error instead of silently picking another file.

use std::path::{Path, PathBuf};

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Path set via environment variable.
    Environment,

    /// Found under `SG_CONFIG_DIR`.
    ConfigDir,

    /// Found in the XDG config directory.
    XdgConfig,

    /// Found in /etc/safeguard/.
    SystemConfig,

    /// Nothing found; built-in defaults apply (if the file has any).
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::ConfigDir => write!(f, "config dir"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A resolved configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub source: ConfigSource,
}

/// Environment variable names.
pub const ENV_RULES_PATH: &str = "SG_RULES";
pub const ENV_REDACTION_POLICY_PATH: &str = "SG_REDACTION_POLICY";
pub const ENV_CONFIG_DIR: &str = "SG_CONFIG_DIR";

/// Standard config file names.
pub const RULES_FILENAME: &str = "rules.json";
pub const REDACTION_POLICY_FILENAME: &str = "redaction.json";

/// Application name for XDG directories.
const APP_NAME: &str = "safeguard";

const SYSTEM_CONFIG_DIR: &str = "/etc/safeguard";

/// Inputs to path resolution, captured once so resolution is testable
/// without touching the process environment.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    pub env_file: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub xdg_dir: Option<PathBuf>,
    pub system_dir: Option<PathBuf>,
}

impl SearchPaths {
    /// Read the environment for the given per-file variable.
    pub fn from_env(env_var: &str) -> Self {
        Self {
            env_file: std::env::var_os(env_var).map(PathBuf::from),
            config_dir: std::env::var_os(ENV_CONFIG_DIR).map(PathBuf::from),
            xdg_dir: dirs::config_dir().map(|d| d.join(APP_NAME)),
            system_dir: Some(PathBuf::from(SYSTEM_CONFIG_DIR)),
        }
    }

    /// Resolve `filename`. `None` means nothing was found.
    pub fn resolve(&self, cli_path: Option<&Path>, filename: &str) -> Option<ResolvedPath> {
        if let Some(path) = cli_path {
            return Some(ResolvedPath {
                path: path.to_path_buf(),
                source: ConfigSource::CliArgument,
            });
        }

        if let Some(path) = &self.env_file {
            return Some(ResolvedPath {
                path: path.clone(),
                source: ConfigSource::Environment,
            });
        }

        let candidates = [
            (&self.config_dir, ConfigSource::ConfigDir),
            (&self.xdg_dir, ConfigSource::XdgConfig),
            (&self.system_dir, ConfigSource::SystemConfig),
        ];
        for (dir, source) in candidates {
            if let Some(dir) = dir {
                let path = dir.join(filename);
                if path.is_file() {
                    return Some(ResolvedPath { path, source });
                }
            }
        }

        None
    }
}

/// Resolve the rules file. There is no built-in rule set.
pub fn resolve_rules(cli_path: Option<&Path>) -> Option<ResolvedPath> {
    SearchPaths::from_env(ENV_RULES_PATH).resolve(cli_path, RULES_FILENAME)
}

/// Resolve the redaction policy file. `None` means use the default policy.
pub fn resolve_redaction_policy(cli_path: Option<&Path>) -> Option<ResolvedPath> {
    SearchPaths::from_env(ENV_REDACTION_POLICY_PATH).resolve(cli_path, REDACTION_POLICY_FILENAME)
}
