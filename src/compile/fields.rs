//! Field validation and materialization
//!
//! Each section and segment kind has a table of required, optional, and
//! forbidden fields. Unknown field names are compared against the legal set
//! with an edit-distance heuristic: a close match downgrades to a `warning`
//! with a "did you mean" suggestion, since the author almost certainly
//! mistyped a legal field rather than invented a new one.
//!
//! This module also materializes raw segments and lens/page sections into
//! the typed output model once their fields have been checked.

use crate::compile::diagnostics::{ContentError, Diagnostics};
use crate::compile::frontmatter::DocumentKind;
use crate::compile::model::{Section, SectionKind, Segment};
use crate::compile::parsing::{
    RawDocument, RawSection, RawSectionKind, RawSegment, RawSegmentKind,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Where a field appears, for table lookup and typo matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldContext {
    Section(RawSectionKind),
    Segment(RawSegmentKind),
}

struct FieldSpec {
    required: &'static [&'static str],
    optional: &'static [&'static str],
    forbidden: &'static [&'static str],
}

impl FieldSpec {
    fn legal(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.required.iter().chain(self.optional).copied()
    }
}

fn spec_for(context: FieldContext) -> &'static FieldSpec {
    use RawSectionKind as Sec;
    use RawSegmentKind as Seg;

    static PAGE: FieldSpec = FieldSpec {
        required: &[],
        optional: &["optional"],
        forbidden: &[],
    };
    static VIDEO: FieldSpec = FieldSpec {
        required: &["title", "source"],
        optional: &["author", "channel", "optional"],
        forbidden: &[],
    };
    static ARTICLE: FieldSpec = FieldSpec {
        required: &["title", "source"],
        optional: &["author", "optional"],
        forbidden: &["channel"],
    };
    static REF_ONLY: FieldSpec = FieldSpec {
        required: &["ref"],
        optional: &[],
        forbidden: &[],
    };
    static NONE: FieldSpec = FieldSpec {
        required: &[],
        optional: &[],
        forbidden: &[],
    };
    static TEXT: FieldSpec = FieldSpec {
        required: &["content"],
        optional: &[],
        forbidden: &[],
    };
    static CHAT: FieldSpec = FieldSpec {
        required: &["instructions"],
        optional: &["student-visible", "optional"],
        forbidden: &[],
    };
    static VIDEO_EXCERPT: FieldSpec = FieldSpec {
        required: &["start", "end"],
        optional: &["transcript"],
        forbidden: &["content"],
    };
    static ARTICLE_EXCERPT: FieldSpec = FieldSpec {
        required: &["content"],
        optional: &[],
        forbidden: &["start", "end"],
    };

    match context {
        FieldContext::Section(Sec::Page) => &PAGE,
        FieldContext::Section(Sec::Video) => &VIDEO,
        FieldContext::Section(Sec::Article) => &ARTICLE,
        FieldContext::Section(Sec::LearningOutcome)
        | FieldContext::Section(Sec::Uncategorized)
        | FieldContext::Section(Sec::LensRef) => &REF_ONLY,
        FieldContext::Section(Sec::Progression) => &NONE,
        FieldContext::Segment(Seg::Text) => &TEXT,
        FieldContext::Segment(Seg::Chat) => &CHAT,
        FieldContext::Segment(Seg::VideoExcerpt) => &VIDEO_EXCERPT,
        FieldContext::Segment(Seg::ArticleExcerpt) => &ARTICLE_EXCERPT,
    }
}

/// Fields whose values must be booleans, in any context.
const BOOL_FIELDS: &[&str] = &["optional", "student-visible"];

/// Fields whose values must be `mm:ss` / `hh:mm:ss` timestamps.
const TIMESTAMP_FIELDS: &[&str] = &["start", "end"];

static TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?$").expect("timestamp pattern compiles"));

/// `true`/`yes`/`1` and `false`/`no`/`0`, case-insensitive.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Whether `key` is a legal field — or a near-miss of one — in `context`.
/// Used to decide if a single-colon line was a botched field assignment.
pub fn resembles_field(key: &str, context: FieldContext) -> bool {
    let lowered = key.to_ascii_lowercase();
    let spec = spec_for(context);
    spec.legal().any(|legal| legal == lowered)
        || spec.forbidden.contains(&lowered.as_str())
        || close_match(&lowered, spec).is_some()
}

/// The closest legal field name, if the distance is small enough to call it
/// a typo. Distance 1 always qualifies; distance 2 only when the first
/// letters agree (keeps `contnet`→`content` while leaving short unrelated
/// names alone).
fn close_match(key: &str, spec: &FieldSpec) -> Option<&'static str> {
    let mut best: Option<(usize, &'static str)> = None;
    for legal in spec.legal() {
        let distance = levenshtein(key, legal);
        let qualifies = distance == 1
            || (distance == 2
                && key.chars().next() == legal.chars().next()
                && legal.len() >= 4);
        if qualifies && best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, legal));
        }
    }
    best.map(|(_, legal)| legal)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Which section kinds each document kind may contain.
fn allowed_sections(kind: DocumentKind) -> &'static [RawSectionKind] {
    match kind {
        DocumentKind::Course => &[RawSectionKind::Progression],
        DocumentKind::Module => &[
            RawSectionKind::Page,
            RawSectionKind::LearningOutcome,
            RawSectionKind::Uncategorized,
        ],
        DocumentKind::LearningOutcome => &[RawSectionKind::LensRef],
        DocumentKind::Lens => &[RawSectionKind::Video, RawSectionKind::Article],
    }
}

/// Validate one parsed document: frontmatter requirements, section
/// placement, and every section's and segment's fields.
pub fn validate_document(doc: &RawDocument, diags: &mut Diagnostics) {
    let path = doc.path.as_str();

    if let Some(kind) = doc.frontmatter.kind {
        validate_frontmatter(doc, kind, diags);
        for section in &doc.sections {
            if !allowed_sections(kind).contains(&section.kind) {
                diags.push(
                    ContentError::error(
                        path,
                        format!(
                            "`{}` sections are not allowed in a {} document",
                            section.kind.keyword(),
                            kind.as_str()
                        ),
                    )
                    .at_line(section.line),
                );
            }
        }
        validate_shape(doc, kind, diags);
    }

    for section in &doc.sections {
        validate_fields(
            path,
            FieldContext::Section(section.kind),
            section.line,
            &section.fields,
            section.title.as_deref(),
            diags,
        );
        for segment in &section.segments {
            validate_fields(
                path,
                FieldContext::Segment(segment.kind),
                segment.line,
                &segment.fields,
                None,
                diags,
            );
            if segment.kind.is_excerpt() {
                for (line, content) in &segment.stray {
                    diags.push(
                        ContentError::error(
                            path,
                            format!(
                                "`{}` segments admit only fields and blank lines, found: {}",
                                segment.kind.keyword(),
                                content.trim()
                            ),
                        )
                        .at_line(*line),
                    );
                }
            }
        }
    }
}

fn validate_frontmatter(doc: &RawDocument, kind: DocumentKind, diags: &mut Diagnostics) {
    let needs_title = matches!(kind, DocumentKind::Course | DocumentKind::Module);
    if needs_title && doc.frontmatter.title.is_none() {
        diags.push(ContentError::error(
            &doc.path,
            format!("{} frontmatter is missing required key `title`", kind.as_str()),
        ));
    }
    if kind == DocumentKind::LearningOutcome && doc.frontmatter.id.is_none() {
        diags.push(ContentError::error(
            &doc.path,
            "learning-outcome frontmatter is missing required key `id`",
        ));
    }
}

/// Kind-level shape requirements beyond individual fields.
fn validate_shape(doc: &RawDocument, kind: DocumentKind, diags: &mut Diagnostics) {
    match kind {
        DocumentKind::Course => {
            if doc
                .sections_of_kind(RawSectionKind::Progression)
                .next()
                .is_none()
            {
                diags.push(ContentError::error(
                    &doc.path,
                    "course has no `# Progression` section",
                ));
            }
        }
        DocumentKind::LearningOutcome => {
            if doc.sections_of_kind(RawSectionKind::LensRef).next().is_none() {
                diags.push(ContentError::error(
                    &doc.path,
                    "learning outcome references no lenses (`# Lens` sections)",
                ));
            }
        }
        DocumentKind::Lens => {
            let media = doc
                .sections
                .iter()
                .filter(|s| {
                    matches!(s.kind, RawSectionKind::Video | RawSectionKind::Article)
                })
                .count();
            if media != 1 {
                diags.push(ContentError::error(
                    &doc.path,
                    format!(
                        "a lens must contain exactly one Video or Article section, found {}",
                        media
                    ),
                ));
            }
        }
        DocumentKind::Module => {}
    }
}

fn validate_fields(
    path: &str,
    context: FieldContext,
    header_line: usize,
    fields: &[crate::compile::parsing::RawField],
    header_title: Option<&str>,
    diags: &mut Diagnostics,
) {
    let spec = spec_for(context);
    let context_name = match context {
        FieldContext::Section(kind) => kind.keyword(),
        FieldContext::Segment(kind) => kind.keyword(),
    };

    for required in spec.required {
        let satisfied = fields.iter().any(|f| f.key.eq_ignore_ascii_case(required))
            // A section's title may come from the header suffix instead.
            || (*required == "title" && header_title.is_some());
        if !satisfied {
            diags.push(
                ContentError::error(
                    path,
                    format!(
                        "`{}` is missing required field `{}::`",
                        context_name, required
                    ),
                )
                .at_line(header_line),
            );
        }
    }

    for field in fields {
        let key = field.key.to_ascii_lowercase();
        if spec.forbidden.contains(&key.as_str()) {
            diags.push(
                ContentError::error(
                    path,
                    format!("field `{}::` is not allowed on `{}`", field.key, context_name),
                )
                .at_line(field.line),
            );
            continue;
        }
        if !spec.legal().any(|legal| legal == key) {
            match close_match(&key, spec) {
                Some(suggested) => diags.push(
                    ContentError::warning(
                        path,
                        format!("unknown field `{}::` on `{}`", field.key, context_name),
                    )
                    .at_line(field.line)
                    .with_suggestion(format!("did you mean `{}::`?", suggested)),
                ),
                None => diags.push(
                    ContentError::error(
                        path,
                        format!("unknown field `{}::` on `{}`", field.key, context_name),
                    )
                    .at_line(field.line),
                ),
            }
            continue;
        }
        if BOOL_FIELDS.contains(&key.as_str()) && parse_bool(&field.value).is_none() {
            diags.push(
                ContentError::error(
                    path,
                    format!(
                        "field `{}::` expects a boolean (true/yes/1 or false/no/0), got `{}`",
                        field.key, field.value
                    ),
                )
                .at_line(field.line),
            );
        }
        if TIMESTAMP_FIELDS.contains(&key.as_str())
            && matches!(context, FieldContext::Segment(RawSegmentKind::VideoExcerpt))
            && !TIMESTAMP.is_match(field.value.trim())
        {
            diags.push(
                ContentError::error(
                    path,
                    format!(
                        "field `{}::` expects a `mm:ss` or `hh:mm:ss` timestamp, got `{}`",
                        field.key, field.value
                    ),
                )
                .at_line(field.line),
            );
        }
    }
}

/// Materialize a raw segment into the output model. Returns `None` when a
/// required field is absent; the omission was already reported by
/// [`validate_document`].
pub fn materialize_segment(raw: &RawSegment) -> Option<Segment> {
    let field = |key: &str| {
        raw.fields
            .iter()
            .find(|f| f.key.eq_ignore_ascii_case(key))
            .map(|f| f.value.clone())
    };
    match raw.kind {
        RawSegmentKind::Text => Some(Segment::Text {
            content: field("content")?,
        }),
        RawSegmentKind::Chat => Some(Segment::Chat {
            instructions: field("instructions")?,
            student_visible: field("student-visible")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(true),
            optional: field("optional")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(false),
        }),
        RawSegmentKind::VideoExcerpt => Some(Segment::VideoExcerpt {
            start: field("start")?,
            end: field("end")?,
            transcript: field("transcript"),
        }),
        RawSegmentKind::ArticleExcerpt => Some(Segment::ArticleExcerpt {
            content: field("content")?,
        }),
    }
}

/// Materialize a renderable raw section (page or lens media) into the
/// output model. Segments that failed materialization are skipped.
pub fn materialize_section(raw: &RawSection) -> Option<Section> {
    let kind = match raw.kind {
        RawSectionKind::Page => SectionKind::Page,
        RawSectionKind::Video => SectionKind::VideoLens,
        RawSectionKind::Article => SectionKind::ArticleLens,
        _ => return None,
    };
    let field = |key: &str| raw.field(key).map(|f| f.value.clone());
    Some(Section {
        kind,
        title: field("title").or_else(|| raw.title.clone()),
        author: field("author"),
        source: field("source"),
        channel: field("channel"),
        optional: field("optional")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(false),
        learning_outcome: None,
        segments: raw.segments.iter().filter_map(materialize_segment).collect(),
    })
}
