//! Compiled data model
//!
//! These are the types the runtime API consumes, serialized as the
//! `modules` / `courses` arrays of the output JSON. Segment and progression
//! kinds are closed sum types so that a forgotten case fails to compile
//! instead of silently no-op'ing.
//!
//! Learning outcomes and lenses do not appear here: they are intermediate
//! authored documents that exist only during compilation, and only their
//! flattened effects survive into [`Section`] lists.

use serde::Serialize;

/// Kind tag of a compiled (renderable) section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    Page,
    VideoLens,
    ArticleLens,
}

/// One renderable block of a module: an authored page or an inlined lens.
///
/// `learning_outcome` is filled by the flattener: the owning learning
/// outcome's identifier, or explicitly `null` for pages and uncategorized
/// material. It always serializes, absent or not, so consumers can rely on
/// the key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub optional: bool,
    pub learning_outcome: Option<String>,
    pub segments: Vec<Segment>,
}

impl Section {
    pub fn page(title: Option<String>) -> Self {
        Self {
            kind: SectionKind::Page,
            title,
            author: None,
            source: None,
            channel: None,
            optional: false,
            learning_outcome: None,
            segments: Vec::new(),
        }
    }
}

/// Smallest teaching unit. Each variant carries only the fields legal for
/// its kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Segment {
    Text {
        content: String,
    },
    Chat {
        instructions: String,
        #[serde(rename = "student-visible")]
        student_visible: bool,
        optional: bool,
    },
    ArticleExcerpt {
        content: String,
    },
    VideoExcerpt {
        start: String,
        end: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        transcript: Option<String>,
    },
}

/// A compiled lesson module: flat, ordered sections plus the warnings
/// accumulated while flattening it (excluded entries, empty sections).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub sections: Vec<Section>,
    pub warnings: Vec<String>,
}

/// One entry of a course's progression: a reference to a module by slug, or
/// a live-meeting marker. Unresolved references never appear here — they
/// are dropped after an error diagnostic is emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ProgressionItem {
    Module { slug: String, optional: bool },
    Meeting,
}

/// A compiled course outline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub slug: String,
    pub title: String,
    pub progression: Vec<ProgressionItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_serializes_internally_tagged() {
        let segment = Segment::VideoExcerpt {
            start: "01:30".to_string(),
            end: "02:45".to_string(),
            transcript: None,
        };
        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["type"], "video-excerpt");
        assert_eq!(json["start"], "01:30");
        assert!(json.get("transcript").is_none());
    }

    #[test]
    fn test_chat_segment_field_names() {
        let segment = Segment::Chat {
            instructions: "Ask the student to summarize.".to_string(),
            student_visible: true,
            optional: false,
        };
        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["type"], "chat");
        assert_eq!(json["student-visible"], true);
        assert_eq!(json["optional"], false);
    }

    #[test]
    fn test_section_learning_outcome_always_serializes() {
        let section = Section::page(Some("Welcome".to_string()));
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["kind"], "page");
        assert!(json["learning_outcome"].is_null());
        // Absent metadata keys are omitted entirely.
        assert!(json.get("author").is_none());
    }

    #[test]
    fn test_progression_item_shapes() {
        let module = ProgressionItem::Module {
            slug: "my-cool-module".to_string(),
            optional: true,
        };
        let json = serde_json::to_value(&module).unwrap();
        assert_eq!(json["type"], "module");
        assert_eq!(json["slug"], "my-cool-module");
        assert!(json.get("path").is_none());

        let meeting = serde_json::to_value(ProgressionItem::Meeting).unwrap();
        assert_eq!(meeting, serde_json::json!({ "type": "meeting" }));
    }
}
