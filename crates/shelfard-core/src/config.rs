//! Configuration schema (shelfard.toml)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "shelfard.toml";

/// Snapshot registry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Root directory for stored snapshots
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

fn default_registry_path() -> PathBuf {
    PathBuf::from(".shelfard/registry")
}

/// HTTP fetch settings for REST sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header value
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            headers: BTreeMap::new(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("shelfard/{}", env!("CARGO_PKG_VERSION"))
}

/// Schema inference settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Record the observed string length as `max_len`.
    ///
    /// One sample does not establish a real bound, so this is an approximation.
    /// Disable it to infer unbounded strings.
    #[serde(default = "default_true")]
    pub string_lengths: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self { string_lengths: true }
    }
}

fn default_true() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot registry
    #[serde(default)]
    pub registry: RegistryConfig,

    /// HTTP settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Inference settings
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Directory of the loaded config file (for resolving relative paths)
    #[serde(skip)]
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut config = Self::from_toml(&contents)?;

        // Relative paths are resolved against the config file's directory
        if let Some(parent) = path.parent() {
            config.project_root = Some(parent.to_path_buf());
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load an explicit config file, else `shelfard.toml` in `dir` if present, else defaults
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Registry directory, resolved against the config file's directory
    pub fn registry_path(&self) -> PathBuf {
        match &self.project_root {
            Some(root) if self.registry.path.is_relative() => root.join(&self.registry.path),
            _ => self.registry.path.clone(),
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
