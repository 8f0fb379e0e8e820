//! Document parser
//!
//! Assembles one document's classified lines into raw sections and segments.
//! "Raw" because cross-file references are still unresolved and field values
//! are untyped strings; resolution and materialization happen in later
//! phases over the whole vault.
//!
//! The parser never fails. Every local syntax violation — a type keyword at
//! the wrong depth, a field typed with a single colon, an unknown keyword —
//! becomes a diagnostic with a line number, and parsing continues with
//! whatever structure is recoverable.

use crate::compile::diagnostics::{ContentError, Diagnostics};
use crate::compile::fields::{self, FieldContext};
use crate::compile::frontmatter::{self, Frontmatter};
use crate::compile::lexing::{self, LineKind};

/// Section kinds as authored, before flattening. `LensRef` is the `# Lens`
/// reference block inside a learning-outcome document; `Progression` only
/// appears in courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSectionKind {
    Page,
    Video,
    Article,
    LearningOutcome,
    Uncategorized,
    LensRef,
    Progression,
}

impl RawSectionKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            RawSectionKind::Page => "Page",
            RawSectionKind::Video => "Video",
            RawSectionKind::Article => "Article",
            RawSectionKind::LearningOutcome => "Learning Outcome",
            RawSectionKind::Uncategorized => "Uncategorized",
            RawSectionKind::LensRef => "Lens",
            RawSectionKind::Progression => "Progression",
        }
    }

    /// Whether this section kind hosts teaching segments.
    pub fn hosts_segments(&self) -> bool {
        matches!(
            self,
            RawSectionKind::Page | RawSectionKind::Video | RawSectionKind::Article
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSegmentKind {
    Text,
    Chat,
    VideoExcerpt,
    ArticleExcerpt,
}

impl RawSegmentKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            RawSegmentKind::Text => "Text",
            RawSegmentKind::Chat => "Chat",
            RawSegmentKind::VideoExcerpt => "Video-excerpt",
            RawSegmentKind::ArticleExcerpt => "Article-excerpt",
        }
    }

    /// Excerpt segments admit nothing but recognized fields and blank lines.
    pub fn is_excerpt(&self) -> bool {
        matches!(
            self,
            RawSegmentKind::VideoExcerpt | RawSegmentKind::ArticleExcerpt
        )
    }
}

/// One `key:: value` assignment, value fully accumulated but untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    pub key: String,
    pub value: String,
    pub line: usize,
}

/// One dash-list entry of a progression section.
#[derive(Debug, Clone, PartialEq)]
pub struct RawListItem {
    pub text: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSegment {
    pub kind: RawSegmentKind,
    pub line: usize,
    pub fields: Vec<RawField>,
    /// Non-field, non-blank lines that landed inside the segment.
    pub stray: Vec<(usize, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSection {
    pub kind: RawSectionKind,
    /// Title from the header suffix (`# Page: Welcome`).
    pub title: Option<String>,
    pub line: usize,
    pub fields: Vec<RawField>,
    pub segments: Vec<RawSegment>,
    pub items: Vec<RawListItem>,
}

impl RawSection {
    fn new(kind: RawSectionKind, title: Option<String>, line: usize) -> Self {
        Self {
            kind,
            title,
            line,
            fields: Vec::new(),
            segments: Vec::new(),
            items: Vec::new(),
        }
    }

    /// First value of the named field, if present. Keys compare
    /// case-insensitively throughout.
    pub fn field(&self, key: &str) -> Option<&RawField> {
        self.fields
            .iter()
            .find(|field| field.key.eq_ignore_ascii_case(key))
    }

    /// All values of the named field, in authored order.
    pub fn field_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a RawField> {
        self.fields
            .iter()
            .filter(move |field| field.key.eq_ignore_ascii_case(key))
    }
}

/// A fully parsed but unresolved document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub path: String,
    pub frontmatter: Frontmatter,
    pub sections: Vec<RawSection>,
}

impl RawDocument {
    pub fn sections_of_kind(
        &self,
        kind: RawSectionKind,
    ) -> impl Iterator<Item = &RawSection> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }
}

/// Parse one document. Always returns a (possibly partial) result; local
/// problems are pushed onto `diags`.
pub fn parse_document(path: &str, text: &str, diags: &mut Diagnostics) -> RawDocument {
    let split = frontmatter::split(path, text, diags);
    let mut assembler = Assembler::new(path);

    for (offset, raw_line) in split.body.lines().enumerate() {
        let line_number = split.body_first_line + offset;
        assembler.handle_line(raw_line, line_number, diags);
    }
    assembler.finish(split.frontmatter, diags)
}

/// A field whose value is still being accumulated across lines.
struct OpenField {
    key: String,
    line: usize,
    first: String,
    continuation: Vec<String>,
}

impl OpenField {
    fn finalize(self) -> RawField {
        let mut lines = self.continuation;
        // Internal blank lines are content; trailing ones are not, and
        // neither are leading ones when the key's own line held no value.
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        if self.first.is_empty() {
            while lines.first().is_some_and(|line| line.trim().is_empty()) {
                lines.remove(0);
            }
        }
        let value = if lines.is_empty() {
            self.first
        } else if self.first.is_empty() {
            lines.join("\n")
        } else {
            format!("{}\n{}", self.first, lines.join("\n"))
        };
        RawField {
            key: self.key,
            value,
            line: self.line,
        }
    }
}

struct Assembler {
    path: String,
    sections: Vec<RawSection>,
    section: Option<RawSection>,
    segment: Option<RawSegment>,
    open_field: Option<OpenField>,
}

impl Assembler {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            sections: Vec::new(),
            section: None,
            segment: None,
            open_field: None,
        }
    }

    fn handle_line(&mut self, raw_line: &str, line_number: usize, diags: &mut Diagnostics) {
        let kind = lexing::classify(raw_line);

        // Multi-line values run until the next field key or a section/segment
        // header. Deeper `###` runs are ordinary value content.
        if self.open_field.is_some() {
            match &kind {
                LineKind::Header { depth, .. } if *depth <= 2 => {
                    self.close_field();
                }
                LineKind::Field { .. } => {
                    self.close_field();
                }
                _ => {
                    let open = self.open_field.as_mut().expect("field is open");
                    open
                        .continuation
                        .push(lexing::materialize_value_line(raw_line).trim_end().to_string());
                    return;
                }
            }
        }

        match kind {
            LineKind::Header { depth, text } => self.handle_header(depth, &text, line_number, diags),
            LineKind::Field { key, value } => {
                if self.section.is_none() {
                    diags.push(
                        ContentError::error(
                            &self.path,
                            format!("field `{}::` appears before any section header", key),
                        )
                        .at_line(line_number),
                    );
                    return;
                }
                self.open_field = Some(OpenField {
                    key,
                    line: line_number,
                    first: value,
                    continuation: Vec::new(),
                });
            }
            LineKind::SingleColonCandidate { key, value } => {
                self.handle_colon_candidate(&key, &value, raw_line, line_number, diags)
            }
            LineKind::ListItem { text } => self.handle_list_item(&text, raw_line, line_number),
            LineKind::Blank => {}
            LineKind::Text { content } => self.handle_text(&content, line_number),
        }
    }

    fn handle_header(
        &mut self,
        depth: usize,
        text: &str,
        line_number: usize,
        diags: &mut Diagnostics,
    ) {
        let (keyword, title) = match text.split_once(':') {
            Some((keyword, title)) => (keyword.trim(), Some(title.trim().to_string())),
            None => (text.trim(), None),
        };
        let title = title.filter(|t| !t.is_empty());
        let lowered = keyword.to_ascii_lowercase();

        let section_kind = section_keyword(&lowered);
        let segment_kind = segment_keyword(&lowered);

        match (depth, section_kind, segment_kind) {
            (1, Some(kind), _) => self.start_section(kind, title, line_number),
            (2, _, Some(kind)) => self.start_segment(kind, line_number, diags),
            (_, Some(kind), _) => diags.push(
                ContentError::error(
                    &self.path,
                    format!(
                        "`{}` is a section header and takes a single `#`, not {}",
                        kind.keyword(),
                        "#".repeat(depth)
                    ),
                )
                .at_line(line_number),
            ),
            (_, _, Some(kind)) => diags.push(
                ContentError::error(
                    &self.path,
                    format!(
                        "`{}` is a segment header and takes `##`, not {}",
                        kind.keyword(),
                        "#".repeat(depth)
                    ),
                )
                .at_line(line_number),
            ),
            _ => diags.push(
                ContentError::error(
                    &self.path,
                    format!("unknown header keyword `{}`", keyword),
                )
                .at_line(line_number),
            ),
        }
    }

    fn start_section(&mut self, kind: RawSectionKind, title: Option<String>, line: usize) {
        self.close_segment();
        if let Some(section) = self.section.take() {
            self.sections.push(section);
        }
        self.section = Some(RawSection::new(kind, title, line));
    }

    fn start_segment(&mut self, kind: RawSegmentKind, line: usize, diags: &mut Diagnostics) {
        self.close_segment();
        let Some(section) = &self.section else {
            diags.push(
                ContentError::error(
                    &self.path,
                    format!("`{}` segment appears before any section header", kind.keyword()),
                )
                .at_line(line),
            );
            return;
        };
        if !section.kind.hosts_segments() {
            diags.push(
                ContentError::error(
                    &self.path,
                    format!(
                        "`{}` segments are not allowed inside a `{}` section",
                        kind.keyword(),
                        section.kind.keyword()
                    ),
                )
                .at_line(line),
            );
            return;
        }
        self.segment = Some(RawSegment {
            kind,
            line,
            fields: Vec::new(),
            stray: Vec::new(),
        });
    }

    fn handle_colon_candidate(
        &mut self,
        key: &str,
        value: &str,
        raw_line: &str,
        line_number: usize,
        diags: &mut Diagnostics,
    ) {
        let context = self.field_context();
        let looks_like_field = context
            .map(|ctx| fields::resembles_field(key, ctx))
            .unwrap_or(false);
        if looks_like_field {
            diags.push(
                ContentError::error(
                    &self.path,
                    format!("`{}: {}` uses a single colon", key, value),
                )
                .at_line(line_number)
                .with_suggestion(format!("did you mean `{}::`?", key)),
            );
        } else {
            self.handle_text(raw_line, line_number);
        }
    }

    fn handle_list_item(&mut self, text: &str, raw_line: &str, line_number: usize) {
        match &mut self.section {
            Some(section) if section.kind == RawSectionKind::Progression => {
                section.items.push(RawListItem {
                    text: text.to_string(),
                    line: line_number,
                });
            }
            _ => self.handle_text(raw_line, line_number),
        }
    }

    fn handle_text(&mut self, content: &str, line_number: usize) {
        if let Some(segment) = &mut self.segment {
            segment.stray.push((line_number, content.to_string()));
        }
        // Prose outside any segment (e.g. a byline under a section header)
        // is tolerated and ignored.
    }

    fn field_context(&self) -> Option<FieldContext> {
        if let Some(segment) = &self.segment {
            return Some(FieldContext::Segment(segment.kind));
        }
        self.section
            .as_ref()
            .map(|section| FieldContext::Section(section.kind))
    }

    fn close_field(&mut self) {
        let Some(open) = self.open_field.take() else {
            return;
        };
        let field = open.finalize();
        if let Some(segment) = &mut self.segment {
            segment.fields.push(field);
        } else if let Some(section) = &mut self.section {
            section.fields.push(field);
        }
    }

    fn close_segment(&mut self) {
        self.close_field();
        if let Some(segment) = self.segment.take() {
            if let Some(section) = &mut self.section {
                section.segments.push(segment);
            }
        }
    }

    fn finish(mut self, frontmatter: Frontmatter, _diags: &mut Diagnostics) -> RawDocument {
        self.close_segment();
        if let Some(section) = self.section.take() {
            self.sections.push(section);
        }
        RawDocument {
            path: self.path,
            frontmatter,
            sections: self.sections,
        }
    }
}

fn section_keyword(lowered: &str) -> Option<RawSectionKind> {
    match lowered {
        "page" => Some(RawSectionKind::Page),
        "video" => Some(RawSectionKind::Video),
        "article" => Some(RawSectionKind::Article),
        "learning outcome" => Some(RawSectionKind::LearningOutcome),
        "uncategorized" => Some(RawSectionKind::Uncategorized),
        "lens" => Some(RawSectionKind::LensRef),
        "progression" => Some(RawSectionKind::Progression),
        _ => None,
    }
}

fn segment_keyword(lowered: &str) -> Option<RawSegmentKind> {
    match lowered {
        "text" => Some(RawSegmentKind::Text),
        "chat" => Some(RawSegmentKind::Chat),
        "video-excerpt" => Some(RawSegmentKind::VideoExcerpt),
        "article-excerpt" => Some(RawSegmentKind::ArticleExcerpt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (RawDocument, Diagnostics) {
        let mut diags = Diagnostics::new();
        let doc = parse_document("doc.md", text, &mut diags);
        (doc, diags)
    }

    fn messages(diags: &Diagnostics) -> Vec<String> {
        diags.iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn test_page_with_text_segment() {
        let (doc, diags) = parse(
            "---\nkind: module\ntitle: M\n---\n\
             # Page: Welcome\n## Text\ncontent:: Hello there.\n",
        );
        assert!(diags.is_empty(), "unexpected: {:?}", messages(&diags));
        assert_eq!(doc.sections.len(), 1);
        let section = &doc.sections[0];
        assert_eq!(section.kind, RawSectionKind::Page);
        assert_eq!(section.title.as_deref(), Some("Welcome"));
        assert_eq!(section.segments.len(), 1);
        let segment = &section.segments[0];
        assert_eq!(segment.kind, RawSegmentKind::Text);
        assert_eq!(segment.fields[0].key, "content");
        assert_eq!(segment.fields[0].value, "Hello there.");
    }

    #[test]
    fn test_multiline_value_preserves_blank_lines() {
        let (doc, diags) = parse(
            "---\nkind: module\ntitle: M\n---\n\
             # Page: Welcome\n## Text\ncontent:: First paragraph.\n\nSecond paragraph.\n",
        );
        assert!(diags.is_empty());
        let field = &doc.sections[0].segments[0].fields[0];
        assert_eq!(field.value, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_multiline_value_trims_trailing_blanks() {
        let (doc, _) = parse(
            "---\nkind: module\ntitle: M\n---\n\
             # Page: W\n## Text\ncontent:: Body.\nMore.\n\n\n## Chat\ninstructions:: Go.\n",
        );
        let section = &doc.sections[0];
        assert_eq!(section.segments[0].fields[0].value, "Body.\nMore.");
        assert_eq!(section.segments[1].kind, RawSegmentKind::Chat);
    }

    #[test]
    fn test_field_lookup_ignores_key_case() {
        let (doc, diags) = parse(
            "---\nkind: module\ntitle: M\n---\n\
             # Uncategorized\nRef:: [[lenses/a]]\nref:: [[lenses/b]]\n",
        );
        assert!(diags.is_empty(), "unexpected: {:?}", messages(&diags));
        let section = &doc.sections[0];
        assert_eq!(section.field("ref").unwrap().value, "[[lenses/a]]");
        assert_eq!(section.field_values("ref").count(), 2);
    }

    #[test]
    fn test_blank_line_after_bare_key_is_not_content() {
        let (doc, diags) = parse(
            "---\nkind: module\ntitle: M\n---\n\
             # Page: W\n## Text\ncontent::\n\nBody starts here.\n",
        );
        assert!(diags.is_empty());
        let field = &doc.sections[0].segments[0].fields[0];
        assert_eq!(field.value, "Body starts here.");
    }

    #[test]
    fn test_escaped_hash_inside_value() {
        let (doc, diags) = parse(
            "---\nkind: module\ntitle: M\n---\n\
             # Page: W\n## Text\ncontent:: Shell prompt:\n\\# whoami\n",
        );
        assert!(diags.is_empty());
        let field = &doc.sections[0].segments[0].fields[0];
        assert_eq!(field.value, "Shell prompt:\n# whoami");
    }

    #[test]
    fn test_deep_hash_run_is_value_content() {
        let (doc, diags) = parse(
            "---\nkind: module\ntitle: M\n---\n\
             # Page: W\n## Text\ncontent:: Outline:\n### not a header here\n",
        );
        assert!(diags.is_empty(), "unexpected: {:?}", messages(&diags));
        let field = &doc.sections[0].segments[0].fields[0];
        assert_eq!(field.value, "Outline:\n### not a header here");
    }

    #[test]
    fn test_header_terminates_value() {
        let (doc, _) = parse(
            "---\nkind: module\ntitle: M\n---\n\
             # Page: One\n## Text\ncontent:: Body.\n# Page: Two\n## Text\ncontent:: Other.\n",
        );
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].segments[0].fields[0].value, "Body.");
    }

    #[test]
    fn test_section_keyword_at_segment_depth() {
        let (doc, diags) = parse("---\nkind: lens\n---\n## Video\n");
        assert!(diags.has_errors());
        let diag = diags.iter().next().unwrap();
        assert!(diag.message.contains("`Video` is a section header"));
        assert!(diag.message.contains("single `#`"));
        assert_eq!(diag.line, Some(4));
        assert!(doc.sections.is_empty());
    }

    #[test]
    fn test_segment_keyword_at_section_depth() {
        let (_, diags) = parse("---\nkind: module\ntitle: M\n---\n# Video-excerpt\n");
        assert!(diags.has_errors());
        let diag = diags.iter().next().unwrap();
        assert!(diag.message.contains("`Video-excerpt` is a segment header"));
        assert!(diag.message.contains("##"));
    }

    #[test]
    fn test_unknown_keyword() {
        let (_, diags) = parse("---\nkind: module\ntitle: M\n---\n# Quiz: Pop\n");
        assert!(diags.has_errors());
        assert!(messages(&diags)[0].contains("unknown header keyword `Quiz`"));
    }

    #[test]
    fn test_single_colon_field_is_flagged() {
        let (doc, diags) = parse(
            "---\nkind: module\ntitle: M\n---\n\
             # Page: W\n## Text\ncontent: oops single colon\n",
        );
        assert!(diags.has_errors());
        let diag = diags.iter().next().unwrap();
        assert_eq!(
            diag.suggestion.as_deref(),
            Some("did you mean `content::`?")
        );
        // The botched field is not silently accepted as a value.
        assert!(doc.sections[0].segments[0].fields.is_empty());
    }

    #[test]
    fn test_prose_with_colon_is_not_flagged() {
        let (doc, diags) = parse(
            "---\nkind: module\ntitle: M\n---\n\
             # Page: W\n## Chat\nReminder: be kind\ninstructions:: Go.\n",
        );
        assert!(diags.is_empty(), "unexpected: {:?}", messages(&diags));
        // "Reminder:" is nowhere near a chat field name, so it stays prose.
        let chat = &doc.sections[0].segments[0];
        assert_eq!(chat.stray.len(), 1);
        assert_eq!(chat.fields[0].key, "instructions");
    }

    #[test]
    fn test_prose_after_open_field_joins_the_value() {
        let (doc, diags) = parse(
            "---\nkind: module\ntitle: M\n---\n\
             # Page: W\n## Chat\ninstructions:: Go.\nReminder: be kind\n",
        );
        assert!(diags.is_empty(), "unexpected: {:?}", messages(&diags));
        let chat = &doc.sections[0].segments[0];
        assert_eq!(chat.fields[0].value, "Go.\nReminder: be kind");
        assert!(chat.stray.is_empty());
    }

    #[test]
    fn test_progression_list_items() {
        let (doc, diags) = parse(
            "---\nkind: course\ntitle: C\n---\n\
             # Progression\n- [[modules/Intro]]\n- meeting\n- [[modules/Advanced]] (optional)\n",
        );
        assert!(diags.is_empty());
        let section = &doc.sections[0];
        assert_eq!(section.kind, RawSectionKind::Progression);
        assert_eq!(section.items.len(), 3);
        assert_eq!(section.items[0].text, "[[modules/Intro]]");
        assert_eq!(section.items[1].text, "meeting");
    }

    #[test]
    fn test_field_before_any_section() {
        let (_, diags) = parse("---\nkind: module\ntitle: M\n---\ntitle:: stray\n");
        assert!(diags.has_errors());
        assert!(messages(&diags)[0].contains("before any section header"));
    }

    #[test]
    fn test_segment_before_any_section() {
        let (_, diags) = parse("---\nkind: module\ntitle: M\n---\n## Text\n");
        assert!(diags.has_errors());
        assert!(messages(&diags)[0].contains("`Text` segment appears before any section header"));
    }

    #[test]
    fn test_segment_in_non_hosting_section() {
        let (_, diags) = parse(
            "---\nkind: course\ntitle: C\n---\n# Progression\n## Text\ncontent:: nope\n",
        );
        assert!(diags.has_errors());
        assert!(messages(&diags)
            .iter()
            .any(|m| m.contains("not allowed inside a `Progression` section")));
    }

    #[test]
    fn test_line_numbers_account_for_frontmatter() {
        let (_, diags) = parse("---\nkind: module\ntitle: M\n---\n# Nope\n");
        // frontmatter occupies lines 1-4, the bad header is on line 5
        assert_eq!(diags.iter().next().unwrap().line, Some(5));
    }

    #[test]
    fn test_stray_lines_recorded_on_excerpt_segments() {
        let (doc, _) = parse(
            "---\nkind: lens\n---\n# Video\ntitle:: T\nsource:: https://example.com\n\
             ## Video-excerpt\nfree floating prose\nstart:: 00:10\nend:: 00:55\n",
        );
        let segment = &doc.sections[0].segments[0];
        assert_eq!(segment.kind, RawSegmentKind::VideoExcerpt);
        assert_eq!(segment.stray.len(), 1);
        assert_eq!(segment.stray[0].1, "free floating prose");
    }
}
