//! Judgment event types.
//!
//! A judgment event is a fixed set of nine required fields plus an open map
//! of extension fields (`reason`, `context`, ...). Events are immutable once
//! built; all fields are exposed through accessors only.

use chrono::{DateTime, SubsecRound, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::TrailError;
use crate::serialize::{self, timestamp};
use ajt_core::Encoding;

/// Required fields in serialization order.
pub const REQUIRED_FIELDS: [&str; 9] = [
    "timestamp",
    "run_id",
    "model",
    "decision",
    "risk_level",
    "human_in_loop",
    "policy_version",
    "app_version",
    "session_id",
];

/// Conventional decision values.
///
/// Decisions are an open vocabulary: any non-empty string is accepted and
/// written verbatim. These are the values downstream tooling understands.
pub mod decision {
    pub const ALLOW: &str = "allow";
    pub const BLOCK: &str = "block";
    pub const ESCALATE: &str = "escalate";
    pub const STOP: &str = "stop";

    pub const CONVENTIONAL: [&str; 4] = [ALLOW, BLOCK, ESCALATE, STOP];

    /// Case-insensitive membership in [`CONVENTIONAL`].
    pub fn is_conventional(value: &str) -> bool {
        CONVENTIONAL.iter().any(|c| c.eq_ignore_ascii_case(value))
    }
}

/// Conventional risk levels, lowest first.
pub mod risk {
    pub const LOW: &str = "low";
    pub const MEDIUM: &str = "medium";
    pub const HIGH: &str = "high";
    pub const CRITICAL: &str = "critical";

    pub const CONVENTIONAL: [&str; 4] = [LOW, MEDIUM, HIGH, CRITICAL];

    /// Case-insensitive membership in [`CONVENTIONAL`].
    pub fn is_conventional(value: &str) -> bool {
        CONVENTIONAL.iter().any(|c| c.eq_ignore_ascii_case(value))
    }
}

/// A single AI judgment record.
///
/// Deserialization applies the same required-field checks as
/// [`JudgmentEventBuilder::build`], except that persisted ids must be
/// present rather than generated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawJudgmentEvent")]
pub struct JudgmentEvent {
    /// Wall-clock time the event was built.
    timestamp: DateTime<Utc>,

    /// Unique run identifier.
    run_id: String,

    /// AI model or agent that produced the judgment.
    model: String,

    /// Decision from the caller's policy engine.
    decision: String,

    /// Risk level from the caller's policy engine.
    risk_level: String,

    /// Whether a human made or approved the decision.
    human_in_loop: bool,

    /// Version of the policy logic that produced the decision.
    policy_version: String,

    /// Caller build/version tag.
    app_version: String,

    /// Session identifier.
    session_id: String,

    /// Extension fields, in insertion order.
    extensions: Map<String, Value>,
}

/// Wire form of a judgment event, before validation.
#[derive(Deserialize)]
struct RawJudgmentEvent {
    #[serde(with = "timestamp")]
    timestamp: DateTime<Utc>,
    run_id: String,
    model: String,
    decision: String,
    risk_level: String,
    human_in_loop: bool,
    policy_version: String,
    app_version: String,
    session_id: String,
    #[serde(flatten)]
    extensions: Map<String, Value>,
}

impl TryFrom<RawJudgmentEvent> for JudgmentEvent {
    type Error = TrailError;

    fn try_from(raw: RawJudgmentEvent) -> Result<Self, Self::Error> {
        check_reason(&raw.extensions)?;

        Ok(Self {
            timestamp: raw.timestamp,
            run_id: required("run_id", Some(raw.run_id))?,
            model: required("model", Some(raw.model))?,
            decision: required("decision", Some(raw.decision))?,
            risk_level: required("risk_level", Some(raw.risk_level))?,
            human_in_loop: raw.human_in_loop,
            policy_version: required("policy_version", Some(raw.policy_version))?,
            app_version: required("app_version", Some(raw.app_version))?,
            session_id: required("session_id", Some(raw.session_id))?,
            extensions: raw.extensions,
        })
    }
}

impl JudgmentEvent {
    /// Create a builder for a judgment event.
    pub fn builder() -> JudgmentEventBuilder {
        JudgmentEventBuilder::default()
    }

    /// Build an event from the five caller-owned required fields.
    ///
    /// `timestamp`, `run_id` and `session_id` are generated.
    pub fn new(
        decision: impl Into<String>,
        risk_level: impl Into<String>,
        model: impl Into<String>,
        policy_version: impl Into<String>,
        app_version: impl Into<String>,
    ) -> Result<Self, TrailError> {
        Self::builder()
            .decision(decision)
            .risk_level(risk_level)
            .model(model)
            .policy_version(policy_version)
            .app_version(app_version)
            .build()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn decision(&self) -> &str {
        &self.decision
    }

    pub fn risk_level(&self) -> &str {
        &self.risk_level
    }

    pub fn human_in_loop(&self) -> bool {
        self.human_in_loop
    }

    pub fn policy_version(&self) -> &str {
        &self.policy_version
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// All extension fields, including any that collide with required names.
    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }

    /// Look up one extension field.
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    /// The `reason` extension, if it is a string.
    pub fn reason(&self) -> Option<&str> {
        self.extension("reason").and_then(Value::as_str)
    }

    /// The `context` extension.
    pub fn context(&self) -> Option<&Value> {
        self.extension("context")
    }

    /// Serialize to a single JSON line (no trailing newline).
    pub fn to_line(&self, encoding: Encoding) -> Result<String, TrailError> {
        serialize::to_line(self, encoding)
    }

    /// Format the event as a human-readable log line.
    ///
    /// Format: `[timestamp] DECISION risk=... model=... session=... [human_in_loop=true] [reason="..."] policy=...`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {} risk={} model={} session={}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.decision.to_uppercase(),
            self.risk_level,
            self.model,
            self.session_id,
        );

        if self.human_in_loop {
            line.push_str(" human_in_loop=true");
        }

        if let Some(reason) = self.reason() {
            line.push_str(&format!(" reason=\"{}\"", reason.replace('"', "'")));
        }

        line.push_str(&format!(" policy={}", self.policy_version));
        line
    }
}

impl Serialize for JudgmentEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Required fields win over colliding extension keys.
        let extensions: Vec<_> = self
            .extensions
            .iter()
            .filter(|(key, _)| !REQUIRED_FIELDS.contains(&key.as_str()))
            .collect();

        let mut map = serializer.serialize_map(Some(REQUIRED_FIELDS.len() + extensions.len()))?;
        map.serialize_entry("timestamp", &timestamp::format(&self.timestamp))?;
        map.serialize_entry("run_id", &self.run_id)?;
        map.serialize_entry("model", &self.model)?;
        map.serialize_entry("decision", &self.decision)?;
        map.serialize_entry("risk_level", &self.risk_level)?;
        map.serialize_entry("human_in_loop", &self.human_in_loop)?;
        map.serialize_entry("policy_version", &self.policy_version)?;
        map.serialize_entry("app_version", &self.app_version)?;
        map.serialize_entry("session_id", &self.session_id)?;
        for (key, value) in extensions {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Builder for creating judgment events.
#[derive(Debug, Clone, Default)]
pub struct JudgmentEventBuilder {
    timestamp: Option<DateTime<Utc>>,
    run_id: Option<String>,
    model: Option<String>,
    decision: Option<String>,
    risk_level: Option<String>,
    human_in_loop: bool,
    policy_version: Option<String>,
    app_version: Option<String>,
    session_id: Option<String>,
    extensions: Map<String, Value>,
}

impl JudgmentEventBuilder {
    /// Set the timestamp instead of using the build time.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the run ID instead of generating one.
    pub fn run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn decision(mut self, decision: impl Into<String>) -> Self {
        self.decision = Some(decision.into());
        self
    }

    pub fn risk_level(mut self, risk_level: impl Into<String>) -> Self {
        self.risk_level = Some(risk_level.into());
        self
    }

    pub fn human_in_loop(mut self, human_in_loop: bool) -> Self {
        self.human_in_loop = human_in_loop;
        self
    }

    pub fn policy_version(mut self, policy_version: impl Into<String>) -> Self {
        self.policy_version = Some(policy_version.into());
        self
    }

    pub fn app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = Some(app_version.into());
        self
    }

    /// Set the session ID instead of generating one.
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set the `reason` extension.
    pub fn reason(self, reason: impl Into<String>) -> Self {
        self.extension("reason", Value::String(reason.into()))
    }

    /// Set the `context` extension.
    pub fn context(self, context: Value) -> Self {
        self.extension("context", context)
    }

    /// Set an arbitrary extension field. A later value for the same key
    /// replaces the earlier one.
    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    /// Set an extension from any serializable value.
    ///
    /// Fails with [`TrailError::Serialization`] if the value has no JSON
    /// representation (for example a map with non-string keys).
    pub fn try_extension<T: Serialize + ?Sized>(
        self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<Self, TrailError> {
        let value = serde_json::to_value(value)?;
        Ok(self.extension(key, value))
    }

    /// Build the judgment event.
    ///
    /// Fails if `decision`, `risk_level`, `model`, `policy_version` or
    /// `app_version` is missing or blank, or if a `reason` extension is not a
    /// string. A missing or blank `run_id` or `session_id` is generated.
    pub fn build(self) -> Result<JudgmentEvent, TrailError> {
        let decision = required("decision", self.decision)?;
        let risk_level = required("risk_level", self.risk_level)?;
        let model = required("model", self.model)?;
        let policy_version = required("policy_version", self.policy_version)?;
        let app_version = required("app_version", self.app_version)?;
        check_reason(&self.extensions)?;

        if !decision::is_conventional(&decision) || !risk::is_conventional(&risk_level) {
            tracing::debug!(
                decision = %decision,
                risk_level = %risk_level,
                "Judgment uses an unconventional decision or risk level"
            );
        }

        // Persisted timestamps carry microseconds; truncate so the in-memory
        // event equals its parsed line.
        let timestamp = self.timestamp.unwrap_or_else(Utc::now).trunc_subsecs(6);

        Ok(JudgmentEvent {
            timestamp,
            run_id: generated(self.run_id),
            model,
            decision,
            risk_level,
            human_in_loop: self.human_in_loop,
            policy_version,
            app_version,
            session_id: generated(self.session_id),
            extensions: self.extensions,
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, TrailError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(TrailError::missing(field)),
    }
}

fn check_reason(extensions: &Map<String, Value>) -> Result<(), TrailError> {
    match extensions.get("reason") {
        Some(reason) if !reason.is_string() => Err(TrailError::Validation {
            field: "reason",
            message: "must be a string".to_string(),
        }),
        _ => Ok(()),
    }
}

fn generated(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
