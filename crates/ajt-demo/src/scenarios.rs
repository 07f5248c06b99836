//! Demo judgment scenarios.
//!
//! Each scenario stands in for a decision made by the caller's own logic
//! and records the judgment before anything would be executed. All inputs
//! are deterministic stubs; no model is called.

use ajt_trail::{JudgmentEvent, JudgmentRecorder, PolicyEngine, PolicyVerdict, TrailError};
use chrono::Utc;
use serde_json::json;

pub const MODEL: &str = "demo-agent";
pub const POLICY_VERSION: &str = "demo-v1.0";

/// Session identifier shared by every event of one demo run.
pub fn demo_session_id() -> String {
    format!("demo-session-{}", Utc::now().format("%Y%m%d"))
}

/// A factual claim without citations is stopped.
pub fn hallucination_detection(
    recorder: &JudgmentRecorder,
    session_id: &str,
) -> Result<JudgmentEvent, TrailError> {
    let citations_found = 0;

    recorder
        .builder()
        .decision("STOP")
        .risk_level("high")
        .model(MODEL)
        .policy_version(POLICY_VERSION)
        .session_id(session_id)
        .reason("missing_citation")
        .context(json!({
            "scenario": "hallucination_demo",
            "claim_type": "factual",
            "citations_found": citations_found,
            "rule_triggered": "R1_REQUIRE_EVIDENCE",
        }))
        .build()
}

/// A high-risk shell command goes to a human, who approves it.
pub fn human_override(
    recorder: &JudgmentRecorder,
    session_id: &str,
) -> Result<JudgmentEvent, TrailError> {
    let human_approved = true;

    let (decision, reason) = if human_approved {
        ("ALLOW", "human_approved")
    } else {
        ("STOP", "human_rejected")
    };

    recorder
        .builder()
        .decision(decision)
        .risk_level("high")
        .model(MODEL)
        .policy_version(POLICY_VERSION)
        .session_id(session_id)
        .human_in_loop(true)
        .reason(reason)
        .context(json!({
            "scenario": "code_execution_demo",
            "operation_type": "shell_command",
            "reviewer": "demo_human",
            "approval_timestamp": Utc::now().to_rfc3339(),
        }))
        .build()
}

/// A request made under an outdated policy version is stopped.
///
/// Returns `None` when the versions match and there is nothing to record.
pub fn policy_compliance(
    recorder: &JudgmentRecorder,
    session_id: &str,
    request_policy: &str,
    current_policy: &str,
) -> Result<Option<JudgmentEvent>, TrailError> {
    if request_policy == current_policy {
        return Ok(None);
    }

    recorder
        .builder()
        .decision("STOP")
        .risk_level("medium")
        .model(MODEL)
        .policy_version(POLICY_VERSION)
        .session_id(session_id)
        .reason("policy_version_mismatch")
        .context(json!({
            "scenario": "policy_enforcement_demo",
            "requested_policy": request_policy,
            "current_policy": current_policy,
            "rule_triggered": "R2_ENFORCE_CURRENT_POLICY",
        }))
        .build()
        .map(Some)
}

/// Stand-in for a caller's policy engine: blocks prompts asking to delete
/// everything and allows the rest.
pub struct KeywordPolicyEngine {
    version: String,
}

impl KeywordPolicyEngine {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl PolicyEngine for KeywordPolicyEngine {
    fn version(&self) -> &str {
        &self.version
    }

    fn evaluate(&self, input: &str, _session_id: &str) -> anyhow::Result<PolicyVerdict> {
        if input.to_lowercase().contains("delete all") {
            Ok(PolicyVerdict::new("block", "high").with_human_required(true))
        } else {
            Ok(PolicyVerdict::new("allow", "low"))
        }
    }
}
