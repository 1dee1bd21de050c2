//! Structured stage events.
//!
//! Stages emit one JSON object per line on stdout; the supervisor parses these
//! instead of matching prose. Human-readable log lines share the same stream
//! and simply fail to parse, which is how the supervisor tells them apart.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StageEvent {
    /// A new item was planned and persisted.
    ItemPlanned { id: String, idea: String },
    /// An idea was skipped because an item for it already exists.
    PlanSkipped { idea: String },
    /// Rendering started for an item.
    RenderStarted { id: String },
    /// An item rendered successfully and moved to the archive.
    ItemRendered { id: String, path: String },
    /// An item was published.
    ItemUploaded { id: String, url: String },
    /// A per-item or per-idea failure that the stage absorbed.
    StageError { message: String },
    /// A stage run finished.
    StageDone { stage: String, ok: u32, failed: u32 },
}

impl StageEvent {
    /// Print the event as a single JSON line on stdout.
    pub fn emit(&self) {
        // Serialization of this enum cannot fail; fall back to a plain line
        // rather than panic if it somehow does.
        match serde_json::to_string(self) {
            Ok(json) => println!("{json}"),
            Err(_) => println!("{self:?}"),
        }
    }

    /// Parse one stdout line. `None` for anything that is not an event line.
    pub fn parse_line(line: &str) -> Option<StageEvent> {
        serde_json::from_str(line.trim()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_roundtrip() {
        let event = StageEvent::ItemPlanned {
            id: "idea_1_ab".into(),
            idea: "cats".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"item_planned""#));
        assert_eq!(StageEvent::parse_line(&json), Some(event));
    }

    #[test]
    fn test_parse_line_rejects_prose() {
        assert_eq!(StageEvent::parse_line("Planning 3 ideas..."), None);
        assert_eq!(StageEvent::parse_line(""), None);
        // Valid JSON but not an event.
        assert_eq!(StageEvent::parse_line(r#"{"foo": 1}"#), None);
    }

    #[test]
    fn test_stage_done_counts() {
        let json = r#"{"event":"stage_done","stage":"plan","ok":2,"failed":1}"#;
        match StageEvent::parse_line(json) {
            Some(StageEvent::StageDone { stage, ok, failed }) => {
                assert_eq!(stage, "plan");
                assert_eq!(ok, 2);
                assert_eq!(failed, 1);
            }
            other => panic!("Expected StageDone, got {other:?}"),
        }
    }
}
