//! Judgment trail output configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Output destination configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output type.
    #[serde(default)]
    pub kind: OutputKind,

    /// JSONL file path (for `file` and `dual` outputs).
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Character encoding of serialized lines.
    #[serde(default)]
    pub encoding: Encoding,

    /// Level used by the `tracing` output.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            kind: OutputKind::default(),
            path: default_path(),
            encoding: Encoding::default(),
            level: default_level(),
        }
    }
}

/// Output destination type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Append to a JSONL file.
    #[default]
    File,
    /// Print lines to stdout.
    Stdout,
    /// Emit lines as `tracing` events under the `ajt` target.
    Tracing,
    /// File plus stdout.
    Dual,
}

impl OutputKind {
    /// Whether this output appends to `OutputConfig::path`.
    pub fn writes_file(self) -> bool {
        matches!(self, Self::File | Self::Dual)
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Stdout => write!(f, "stdout"),
            Self::Tracing => write!(f, "tracing"),
            Self::Dual => write!(f, "dual"),
        }
    }
}

/// How non-ASCII characters are written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Preserve UTF-8 as-is.
    #[default]
    Utf8,
    /// Escape every non-ASCII character as `\uXXXX`.
    Ascii,
}

fn default_path() -> PathBuf {
    PathBuf::from("ajt_trace.jsonl")
}

fn default_level() -> String {
    "info".to_string()
}
