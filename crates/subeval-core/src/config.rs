//! Harness configuration and evaluation parameters.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! `SUBEVAL_*` environment variables. The CLI applies its flags last.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default external scorer program.
pub const DEFAULT_SCORER_PROGRAM: &str = "ie-eval";

/// Default scorer timeout per invocation, in seconds.
pub const DEFAULT_SCORER_TIMEOUT_SECS: u64 = 3600;

/// Default prediction file extension (without the dot).
pub const DEFAULT_EXTENSION: &str = "bio";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Settings shared by every call made through one harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Program invoked for both metric families.
    pub scorer_program: String,

    /// Per-invocation timeout; 0 waits indefinitely.
    pub scorer_timeout_secs: u64,

    /// Parent directory for workspaces. System temp dir when unset.
    pub temp_root: Option<PathBuf>,

    /// Extension every prediction file must carry.
    pub expected_extension: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            scorer_program: DEFAULT_SCORER_PROGRAM.to_string(),
            scorer_timeout_secs: DEFAULT_SCORER_TIMEOUT_SECS,
            temp_root: None,
            expected_extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load from a TOML file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from the process environment.
    ///
    /// Reads:
    /// - SUBEVAL_SCORER
    /// - SUBEVAL_TIMEOUT_SECS
    /// - SUBEVAL_TEMP_ROOT
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source, e.g. a map in tests.
    pub fn with_vars(mut self, get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(program) = get("SUBEVAL_SCORER") {
            self.scorer_program = program;
        }
        if let Some(raw) = get("SUBEVAL_TIMEOUT_SECS") {
            self.scorer_timeout_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "SUBEVAL_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
        }
        if let Some(root) = get("SUBEVAL_TEMP_ROOT") {
            self.temp_root = Some(PathBuf::from(root));
        }
        Ok(self)
    }
}

/// Free-form evaluation options. Accepted by both entry points and
/// currently ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationParams(pub Map<String, Value>);

impl EvaluationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
