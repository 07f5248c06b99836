//! Policy engine capability.
//!
//! The trail never decides anything. Decisions and risk levels come from the
//! caller's own policy engine; this module only defines the narrow interface
//! the recorder consumes.

use serde::{Deserialize, Serialize};

use crate::event::{JudgmentEvent, JudgmentEventBuilder};

/// Output of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVerdict {
    pub decision: String,
    #[serde(alias = "risk_level")]
    pub risk: String,
    #[serde(default)]
    pub human_required: bool,
}

impl PolicyVerdict {
    pub fn new(decision: impl Into<String>, risk: impl Into<String>) -> Self {
        Self {
            decision: decision.into(),
            risk: risk.into(),
            human_required: false,
        }
    }

    pub fn with_human_required(mut self, human_required: bool) -> Self {
        self.human_required = human_required;
        self
    }

    /// Start an event builder carrying this verdict's decision, risk and
    /// human-in-the-loop flag.
    pub fn into_builder(self) -> JudgmentEventBuilder {
        JudgmentEvent::builder()
            .decision(self.decision)
            .risk_level(self.risk)
            .human_in_loop(self.human_required)
    }
}

/// A caller-owned policy engine.
///
/// Any type that can turn an input into a verdict and name its own version
/// satisfies this.
pub trait PolicyEngine: Send + Sync {
    /// Version tag recorded as `policy_version`.
    fn version(&self) -> &str;

    /// Evaluate `input` for `session_id`.
    fn evaluate(&self, input: &str, session_id: &str) -> anyhow::Result<PolicyVerdict>;
}
