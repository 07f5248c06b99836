//! # ajt-core
//!
//! Configuration types shared across the AJT crates.
//!
//! Configuration is loaded from a single YAML file (`ajt.yaml`). Every
//! section has defaults, so an empty file is a valid configuration that
//! appends UTF-8 JSON Lines to `ajt_trace.jsonl`.

// Configuration types shared across all AJT crates
pub mod config;

pub use config::{
    AjtConfig, ConfigError, Encoding, LogFormat, LoggingConfig, OutputConfig, OutputKind,
};
