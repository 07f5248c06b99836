//! Configuration types for the AI Judgment Trail.
//!
//! # Configuration File
//!
//! ```yaml
//! enabled: true
//! app_version: "1.4.2"
//! output:
//!   kind: file
//!   path: logs/ajt_trace.jsonl
//!   encoding: ascii
//! logging:
//!   level: debug
//!   format: json
//! ```

pub mod logging;
pub mod output;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use logging::{LogFormat, LoggingConfig};
pub use output::{Encoding, OutputConfig, OutputKind};

/// Complete AJT configuration loaded from a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AjtConfig {
    /// Whether judgment recording is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Build/version tag stamped on every recorded event.
    #[serde(default = "default_app_version")]
    pub app_version: String,

    /// Where and how serialized events are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Process logging (the binary's tracing subscriber).
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AjtConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            app_version: default_app_version(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AjtConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    ///
    /// An empty document yields the default configuration.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_version.trim().is_empty() {
            return Err(ConfigError::Config("app_version must not be empty".to_string()));
        }
        if self.output.kind.writes_file() && self.output.path.as_os_str().is_empty() {
            return Err(ConfigError::Config(format!(
                "output.path is required for output kind '{}'",
                self.output.kind
            )));
        }
        Ok(())
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn default_true() -> bool {
    true
}

fn default_app_version() -> String {
    "1.0.0".to_string()
}
