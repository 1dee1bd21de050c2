//! The item lifecycle model.
//!
//! An [`Item`] is one piece of content tracked from planning through publish or
//! rejection. Status only ever moves forward: `planned -> rendered ->
//! {uploaded | rejected}`. Nothing in the crate mutates status except through
//! [`ItemStatus::can_transition_to`]-guarded paths.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle status of an item. Serialized lowercase to match the persisted
/// record format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Planned,
    Rendered,
    Uploaded,
    Rejected,
}

impl ItemStatus {
    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        matches!(
            (self, next),
            (ItemStatus::Planned, ItemStatus::Rendered)
                | (ItemStatus::Rendered, ItemStatus::Uploaded)
                | (ItemStatus::Rendered, ItemStatus::Rejected)
        )
    }

    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Uploaded | ItemStatus::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Planned => "planned",
            ItemStatus::Rendered => "rendered",
            ItemStatus::Uploaded => "uploaded",
            ItemStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One word of a narration transcript with its time window in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// Validate transcript ordering: each word has `start <= end` and starts are
/// non-decreasing across the sequence.
pub fn validate_transcript(words: &[TranscriptWord]) -> bool {
    let mut prev_start = f64::NEG_INFINITY;
    for w in words {
        if w.start > w.end || w.start < prev_start {
            return false;
        }
        prev_start = w.start;
    }
    true
}

/// Stage-produced payload. The plan stage fills everything except the render
/// and publish outputs, which live on [`Item`] itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemProps {
    pub title: String,
    pub subtitle: String,
    /// Background clips, in composition order.
    #[serde(rename = "mediaPaths")]
    pub media_paths: Vec<PathBuf>,
    #[serde(rename = "audioPath")]
    pub audio_path: PathBuf,
    #[serde(rename = "bgmPath", default, skip_serializing_if = "Option::is_none")]
    pub bgm_path: Option<PathBuf>,
    #[serde(rename = "themeColor")]
    pub theme_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<TranscriptWord>>,
}

/// One piece of content tracked through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Opaque unique id, assigned at plan time, immutable afterwards. Joins the
    /// store record, stage event lines, and approval callbacks.
    pub id: String,
    /// The original free-text prompt; the plan stage dedupes on it.
    pub idea: String,
    pub status: ItemStatus,
    pub props: ItemProps,
    #[serde(
        rename = "finalVideoPath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub final_video_path: Option<PathBuf>,
    #[serde(rename = "uploadId", default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    #[serde(rename = "uploadUrl", default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
}

impl Item {
    /// Create a freshly planned item.
    pub fn new(idea: impl Into<String>, props: ItemProps) -> Self {
        Self::with_id(new_item_id(), idea, props)
    }

    /// Create a planned item with a pre-assigned id (the plan stage mints the
    /// id early so asset filenames can embed it).
    pub fn with_id(id: String, idea: impl Into<String>, props: ItemProps) -> Self {
        Self {
            id,
            idea: idea.into(),
            status: ItemStatus::Planned,
            props,
            final_video_path: None,
            upload_id: None,
            upload_url: None,
        }
    }

    /// Apply a status transition, refusing anything that is not forward.
    pub fn transition(&mut self, next: ItemStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }
}

/// New ids embed a millisecond timestamp so lexical order tracks creation
/// order, plus a uuid fragment so two items planned in the same millisecond
/// cannot collide.
pub fn new_item_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let frag = &uuid::Uuid::new_v4().simple().to_string()[..8];
    format!("idea_{millis}_{frag}")
}

/// Structured outline returned by the idea-generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOutline {
    pub title: String,
    pub subtitle: String,
    #[serde(rename = "searchKeyword")]
    pub search_keyword: String,
    #[serde(default)]
    pub mood: String,
    pub script: String,
    pub color: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> ItemProps {
        ItemProps {
            title: "Title".into(),
            subtitle: "Subtitle".into(),
            media_paths: vec![PathBuf::from("assets/bg.mp4")],
            audio_path: PathBuf::from("assets/tts.mp3"),
            bgm_path: None,
            theme_color: "#FF5733".into(),
            transcript: None,
        }
    }

    #[test]
    fn status_moves_forward_only() {
        assert!(ItemStatus::Planned.can_transition_to(ItemStatus::Rendered));
        assert!(ItemStatus::Rendered.can_transition_to(ItemStatus::Uploaded));
        assert!(ItemStatus::Rendered.can_transition_to(ItemStatus::Rejected));

        assert!(!ItemStatus::Uploaded.can_transition_to(ItemStatus::Planned));
        assert!(!ItemStatus::Rejected.can_transition_to(ItemStatus::Rendered));
        assert!(!ItemStatus::Planned.can_transition_to(ItemStatus::Uploaded));
        assert!(!ItemStatus::Planned.can_transition_to(ItemStatus::Rejected));
    }

    #[test]
    fn terminal_statuses() {
        assert!(ItemStatus::Uploaded.is_terminal());
        assert!(ItemStatus::Rejected.is_terminal());
        assert!(!ItemStatus::Planned.is_terminal());
        assert!(!ItemStatus::Rendered.is_terminal());
    }

    #[test]
    fn item_transition_refuses_regression() {
        let mut item = Item::new("cats", props());
        assert_eq!(item.status, ItemStatus::Planned);
        assert!(item.transition(ItemStatus::Rendered));
        assert!(item.transition(ItemStatus::Uploaded));
        assert!(!item.transition(ItemStatus::Planned));
        assert_eq!(item.status, ItemStatus::Uploaded);
    }

    #[test]
    fn item_ids_are_unique_and_ordered_prefix() {
        let a = new_item_id();
        let b = new_item_id();
        assert_ne!(a, b);
        assert!(a.starts_with("idea_"));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ItemStatus::Planned).unwrap(),
            r#""planned""#
        );
        let back: ItemStatus = serde_json::from_str(r#""rendered""#).unwrap();
        assert_eq!(back, ItemStatus::Rendered);
    }

    #[test]
    fn item_roundtrip_preserves_fields() {
        let mut item = Item::new("dogs", props());
        item.transition(ItemStatus::Rendered);
        item.final_video_path = Some(PathBuf::from("out/x.mp4"));

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains(r#""finalVideoPath""#));
        assert!(json.contains(r#""mediaPaths""#));
        // Unset publish outputs are omitted from the record.
        assert!(!json.contains("uploadId"));

        let back: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, item.id);
        assert_eq!(back.status, ItemStatus::Rendered);
        assert_eq!(back.final_video_path, item.final_video_path);
    }

    #[test]
    fn transcript_validation() {
        let good = vec![
            TranscriptWord {
                word: "hello".into(),
                start: 0.0,
                end: 0.4,
            },
            TranscriptWord {
                word: "world".into(),
                start: 0.4,
                end: 0.9,
            },
        ];
        assert!(validate_transcript(&good));
        assert!(validate_transcript(&[]));

        let inverted = vec![TranscriptWord {
            word: "x".into(),
            start: 1.0,
            end: 0.5,
        }];
        assert!(!validate_transcript(&inverted));

        let out_of_order = vec![
            TranscriptWord {
                word: "b".into(),
                start: 2.0,
                end: 2.5,
            },
            TranscriptWord {
                word: "a".into(),
                start: 1.0,
                end: 1.5,
            },
        ];
        assert!(!validate_transcript(&out_of_order));
    }

    #[test]
    fn plan_outline_parses_collaborator_payload() {
        let json = r##"{
            "title": "Rust in 30s",
            "subtitle": "Why it is fast",
            "searchKeyword": "code matrix",
            "mood": "energetic",
            "script": "Rust compiles to native code.",
            "color": "#DE5D43"
        }"##;
        let outline: PlanOutline = serde_json::from_str(json).unwrap();
        assert_eq!(outline.search_keyword, "code matrix");
        assert_eq!(outline.color, "#DE5D43");
    }
}
