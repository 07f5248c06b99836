//! Reading persisted judgment trails.

use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::TrailError;
use crate::event::JudgmentEvent;

/// Read every event from a JSON Lines trail, in file order.
///
/// Blank lines are skipped. A malformed line, or one with a blank required
/// field, fails the whole read with its 1-based line number.
pub fn read_trail(path: impl AsRef<Path>) -> Result<Vec<JudgmentEvent>, TrailError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut events = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| TrailError::Parse {
            line: idx + 1,
            source,
        })?;
        events.push(event);
    }

    Ok(events)
}

/// Read a trail and keep the events matching `filter`.
pub fn query_trail(
    path: impl AsRef<Path>,
    filter: &JudgmentFilter,
) -> Result<Vec<JudgmentEvent>, TrailError> {
    Ok(filter.apply(read_trail(path)?))
}

/// Filter for querying judgment events.
#[derive(Debug, Clone, Default)]
pub struct JudgmentFilter {
    /// Filter by decision (case-insensitive).
    pub decision: Option<String>,
    /// Filter by risk level (case-insensitive).
    pub risk_level: Option<String>,
    /// Filter by session ID.
    pub session_id: Option<String>,
    /// Filter by model.
    pub model: Option<String>,
    /// Filter by human-in-the-loop flag.
    pub human_in_loop: Option<bool>,
    /// Filter by start time (inclusive).
    pub start_time: Option<DateTime<Utc>>,
    /// Filter by end time (inclusive).
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

impl JudgmentFilter {
    /// Whether a single event passes every set criterion.
    pub fn matches(&self, event: &JudgmentEvent) -> bool {
        if let Some(ref decision) = self.decision {
            if !event.decision().eq_ignore_ascii_case(decision) {
                return false;
            }
        }
        if let Some(ref risk_level) = self.risk_level {
            if !event.risk_level().eq_ignore_ascii_case(risk_level) {
                return false;
            }
        }
        if let Some(ref session_id) = self.session_id {
            if event.session_id() != session_id {
                return false;
            }
        }
        if let Some(ref model) = self.model {
            if event.model() != model {
                return false;
            }
        }
        if let Some(human_in_loop) = self.human_in_loop {
            if event.human_in_loop() != human_in_loop {
                return false;
            }
        }
        if let Some(start) = self.start_time {
            if event.timestamp() < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if event.timestamp() > end {
                return false;
            }
        }
        true
    }

    /// Filter `events`, then apply offset and limit.
    pub fn apply(&self, events: impl IntoIterator<Item = JudgmentEvent>) -> Vec<JudgmentEvent> {
        events
            .into_iter()
            .filter(|e| self.matches(e))
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{FileSink, append};
    use ajt_core::Encoding;
    use chrono::TimeZone;
    use std::fs;

    fn event(decision: &str, risk: &str, human: bool, day: u32) -> JudgmentEvent {
        JudgmentEvent::builder()
            .timestamp(Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap())
            .decision(decision)
            .risk_level(risk)
            .model("demo-agent")
            .policy_version("demo-v1.0")
            .app_version("demo-0.1")
            .session_id("demo-session-20250101")
            .human_in_loop(human)
            .build()
            .unwrap()
    }

    fn write_trail(path: &Path) -> Vec<JudgmentEvent> {
        let sink = FileSink::new(path).unwrap();
        let events = vec![
            event("STOP", "high", false, 1),
            event("ALLOW", "high", true, 2),
            event("STOP", "medium", false, 3),
        ];
        for e in &events {
            append(e, &sink, Encoding::Utf8).unwrap();
        }
        events
    }

    #[test]
    fn test_read_trail_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ajt_trace.jsonl");
        let written = write_trail(&path);

        assert_eq!(read_trail(&path).unwrap(), written);
    }

    #[test]
    fn test_read_trail_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ajt_trace.jsonl");
        write_trail(&path);
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("\n   \n");
        fs::write(&path, content).unwrap();

        assert_eq!(read_trail(&path).unwrap().len(), 3);
    }

    #[test]
    fn test_read_trail_reports_malformed_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ajt_trace.jsonl");
        write_trail(&path);
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("{\"decision\":\"allow\"\n");
        fs::write(&path, content).unwrap();

        let err = read_trail(&path).unwrap_err();
        assert!(matches!(err, TrailError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_read_trail_rejects_blank_decision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ajt_trace.jsonl");
        let events = write_trail(&path);

        let mut blank: serde_json::Value =
            serde_json::from_str(&events[0].to_line(Encoding::Utf8).unwrap()).unwrap();
        blank["decision"] = serde_json::json!("");
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str(&format!("{}\n", blank));
        fs::write(&path, content).unwrap();

        let err = read_trail(&path).unwrap_err();
        assert!(matches!(err, TrailError::Parse { line: 4, .. }));
        assert!(err.to_string().contains("decision"));
    }

    #[test]
    fn test_query_by_decision_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ajt_trace.jsonl");
        write_trail(&path);

        let filter = JudgmentFilter {
            decision: Some("stop".to_string()),
            ..Default::default()
        };
        let stops = query_trail(&path, &filter).unwrap();
        assert_eq!(stops.len(), 2);
        assert!(stops.iter().all(|e| e.decision() == "STOP"));
    }

    #[test]
    fn test_filter_combined_criteria() {
        let events = vec![
            event("STOP", "high", false, 1),
            event("ALLOW", "high", true, 2),
            event("STOP", "medium", false, 3),
        ];

        let filter = JudgmentFilter {
            risk_level: Some("HIGH".to_string()),
            human_in_loop: Some(true),
            ..Default::default()
        };
        let result = filter.apply(events.clone());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].decision(), "ALLOW");

        let filter = JudgmentFilter {
            start_time: Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()),
            end_time: Some(Utc.with_ymd_and_hms(2025, 1, 3, 12, 0, 0).unwrap()),
            ..Default::default()
        };
        assert_eq!(filter.apply(events.clone()).len(), 2);

        let filter = JudgmentFilter {
            offset: Some(1),
            limit: Some(1),
            ..Default::default()
        };
        let page = filter.apply(events);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].decision(), "ALLOW");
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_trail("/nonexistent/ajt_trace.jsonl").unwrap_err();
        assert!(matches!(err, TrailError::Io(_)));
    }
}
