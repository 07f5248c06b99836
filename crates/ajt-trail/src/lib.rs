//! # ajt-trail
//!
//! AI Judgment Trail (AJT) recording.
//!
//! A judgment event records a decision made by the caller's own policy
//! engine, its risk level, and who is responsible for it, *before* the
//! decision takes effect. This crate provides:
//! - [`JudgmentEvent`] and its builder, which validates required fields and
//!   fills generated ones (`timestamp`, `run_id`, `session_id`)
//! - Single-line JSON serialization with stable key order
//! - Append-only sinks (JSON Lines files, stdout, `tracing`)
//! - Reading, filtering and schema validation of persisted trails
//!
//! ## Record Format
//!
//! One JSON object per line. The nine required fields come first, in this
//! order, followed by any extension fields:
//!
//! | Field | Type |
//! |-------|------|
//! | `timestamp` | RFC 3339 UTC string |
//! | `run_id` | string |
//! | `model` | string |
//! | `decision` | string |
//! | `risk_level` | string |
//! | `human_in_loop` | bool |
//! | `policy_version` | string |
//! | `app_version` | string |
//! | `session_id` | string |
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ajt_trail::{FileSink, JudgmentEvent, append};
//! use ajt_core::Encoding;
//!
//! # fn example() -> Result<(), ajt_trail::TrailError> {
//! let sink = FileSink::new("ajt_trace.jsonl")?;
//!
//! let event = JudgmentEvent::builder()
//!     .decision("STOP")
//!     .risk_level("high")
//!     .model("demo-agent")
//!     .policy_version("demo-v1.0")
//!     .app_version("demo-0.1")
//!     .reason("missing_citation")
//!     .build()?;
//!
//! append(&event, &sink, Encoding::Utf8)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod event;
pub mod policy;
pub mod reader;
pub mod recorder;
pub mod schema;
pub mod serialize;
pub mod sink;

pub use ajt_core::Encoding;
pub use error::TrailError;
pub use event::{JudgmentEvent, JudgmentEventBuilder, REQUIRED_FIELDS};
pub use policy::{PolicyEngine, PolicyVerdict};
pub use reader::{JudgmentFilter, query_trail, read_trail};
pub use recorder::JudgmentRecorder;
pub use schema::{validate_line, validate_trail};
pub use serialize::{AsciiFormatter, to_json_string, to_line};
pub use sink::{
    DualSink, FileSink, MemorySink, NullSink, TracingSink, TrailSink, WriterSink, append,
    append_batch, create_sink,
};
