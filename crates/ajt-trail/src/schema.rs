//! JSON Schema validation of persisted judgment lines.
//!
//! The schema is compiled into the binary so validation works without
//! external files.

use jsonschema::Validator;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use crate::error::TrailError;

/// Embedded JSON Schema for a single trail line.
pub const JUDGMENT_EVENT_SCHEMA: &str = include_str!("../../../schemas/JudgmentEvent.schema.json");

const MAX_REPORTED_ERRORS: usize = 20;

fn validator() -> Result<&'static Validator, TrailError> {
    static VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();

    VALIDATOR
        .get_or_init(|| {
            let schema: Value = serde_json::from_str(JUDGMENT_EVENT_SCHEMA)
                .map_err(|e| format!("embedded schema is not JSON: {}", e))?;
            jsonschema::draft202012::options()
                .should_validate_formats(true)
                .build(&schema)
                .map_err(|e| format!("embedded schema does not compile: {}", e))
        })
        .as_ref()
        .map_err(|e| TrailError::Schema(e.clone()))
}

/// Validate a parsed JSON value against the judgment event schema.
pub fn validate_value(instance: &Value) -> Result<(), TrailError> {
    let validator = validator()?;
    if validator.is_valid(instance) {
        return Ok(());
    }

    let messages: Vec<String> = validator
        .iter_errors(instance)
        .take(MAX_REPORTED_ERRORS)
        .enumerate()
        .map(|(idx, err)| format!("{}: {}", idx + 1, err))
        .collect();
    Err(TrailError::Schema(messages.join("; ")))
}

/// Validate one serialized line.
pub fn validate_line(line: &str) -> Result<(), TrailError> {
    let instance: Value = serde_json::from_str(line)?;
    validate_value(&instance)
}

/// Validate every non-blank line of a trail file, returning the number of
/// records checked.
pub fn validate_trail(path: impl AsRef<Path>) -> Result<usize, TrailError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut count = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let instance: Value = serde_json::from_str(&line).map_err(|source| TrailError::Parse {
            line: idx + 1,
            source,
        })?;
        validate_value(&instance).map_err(|e| match e {
            TrailError::Schema(msg) => TrailError::Schema(format!("line {}: {}", idx + 1, msg)),
            other => other,
        })?;
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::JudgmentEvent;
    use crate::sink::{FileSink, append};
    use ajt_core::Encoding;
    use serde_json::json;

    #[test]
    fn test_built_event_validates() {
        let event = JudgmentEvent::builder()
            .decision("STOP")
            .risk_level("high")
            .model("demo-agent")
            .policy_version("demo-v1.0")
            .app_version("demo-0.1")
            .reason("missing_citation")
            .context(json!({"citations_found": 0}))
            .build()
            .unwrap();

        validate_line(&event.to_line(Encoding::Utf8).unwrap()).unwrap();
        validate_line(&event.to_line(Encoding::Ascii).unwrap()).unwrap();
    }

    #[test]
    fn test_canonical_record_validates() {
        let line = r#"{"timestamp":"2025-01-01T00:00:00+00:00","run_id":"a1b2c3d4","model":"gpt-4","decision":"allow","risk_level":"low","human_in_loop":false,"policy_version":"v1.0","app_version":"1.0.0","session_id":"user-session-abc123"}"#;
        validate_line(line).unwrap();
    }

    #[test]
    fn test_missing_field_rejected() {
        let instance = json!({
            "timestamp": "2025-01-01T00:00:00+00:00",
            "run_id": "r",
            "model": "gpt-4",
            "risk_level": "low",
            "human_in_loop": false,
            "policy_version": "v1.0",
            "app_version": "1.0.0",
            "session_id": "s"
        });

        let err = validate_value(&instance).unwrap_err();
        match err {
            TrailError::Schema(msg) => assert!(msg.contains("decision")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_types_rejected() {
        let instance = json!({
            "timestamp": "2025-01-01T00:00:00+00:00",
            "run_id": "r",
            "model": "gpt-4",
            "decision": "",
            "risk_level": "low",
            "human_in_loop": "no",
            "policy_version": "v1.0",
            "app_version": "1.0.0",
            "session_id": "s"
        });
        assert!(matches!(validate_value(&instance), Err(TrailError::Schema(_))));
    }

    #[test]
    fn test_validate_trail_counts_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ajt_trace.jsonl");
        let sink = FileSink::new(&path).unwrap();
        for decision in ["allow", "block"] {
            let event = JudgmentEvent::new(decision, "low", "gpt-4", "v1.0", "1.0.0").unwrap();
            append(&event, &sink, Encoding::Utf8).unwrap();
        }

        assert_eq!(validate_trail(&path).unwrap(), 2);

        std::fs::write(&path, "{\"decision\":\"allow\"}\n").unwrap();
        let err = validate_trail(&path).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
