//! Error types for the trail crate.

use ajt_core::ConfigError;
use thiserror::Error;

/// Errors that can occur while building, writing or reading judgment events.
#[derive(Debug, Error)]
pub enum TrailError {
    /// A required field is missing or empty.
    #[error("invalid judgment event: {field} {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A value could not be represented as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sink open/write failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted line could not be parsed back into an event.
    #[error("malformed trail line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A persisted line does not satisfy the judgment event schema.
    #[error("schema violation: {0}")]
    Schema(String),

    /// The caller's policy engine failed to produce a verdict.
    #[error("policy engine error: {0}")]
    Policy(#[source] anyhow::Error),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TrailError {
    pub(crate) fn missing(field: &'static str) -> Self {
        Self::Validation {
            field,
            message: "is required and must not be empty".to_string(),
        }
    }
}
