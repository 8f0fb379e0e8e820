//! Frontmatter extraction and typed deserialization
//!
//! A document may open with a YAML block fenced by `---` lines. The block
//! carries the document's identity: its kind, slug, title, content
//! identifier, and maturity tier. Required keys vary by kind and are
//! enforced by the field validator; this module only extracts and types the
//! block. A malformed block is an `error` diagnostic and the document is
//! treated as having no frontmatter.

use crate::compile::diagnostics::{ContentError, Diagnostics};
use crate::compile::tiers::Tier;
use serde::Deserialize;

/// What a document claims to be. Drives which sections are legal in its
/// body and which frontmatter keys are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Course,
    Module,
    LearningOutcome,
    Lens,
}

impl DocumentKind {
    pub fn parse(value: &str) -> Option<DocumentKind> {
        match value.trim().to_ascii_lowercase().as_str() {
            "course" => Some(DocumentKind::Course),
            "module" => Some(DocumentKind::Module),
            "learning-outcome" => Some(DocumentKind::LearningOutcome),
            "lens" => Some(DocumentKind::Lens),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Course => "course",
            DocumentKind::Module => "module",
            DocumentKind::LearningOutcome => "learning-outcome",
            DocumentKind::Lens => "lens",
        }
    }
}

/// Typed frontmatter. All keys optional at this stage; kind-specific
/// requirements are checked later against the whole document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    pub kind: Option<DocumentKind>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub id: Option<String>,
    pub tier: Option<Tier>,
}

/// Shape of the YAML block as authored. Unknown keys are tolerated so that
/// editor plugins can stash their own metadata.
#[derive(Debug, Deserialize)]
struct RawFrontmatter {
    kind: Option<String>,
    slug: Option<String>,
    title: Option<String>,
    id: Option<String>,
    tier: Option<String>,
}

/// A document split into its frontmatter and body.
pub struct SplitDocument<'a> {
    pub frontmatter: Frontmatter,
    pub body: &'a str,
    /// 1-based line number of the first body line in the original file.
    pub body_first_line: usize,
}

/// Split `text` into frontmatter and body, reporting YAML problems and
/// unknown `kind`/`tier` values against `path`.
pub fn split<'a>(path: &str, text: &'a str, diags: &mut Diagnostics) -> SplitDocument<'a> {
    let without = SplitDocument {
        frontmatter: Frontmatter::default(),
        body: text,
        body_first_line: 1,
    };

    let mut offsets = text.split_inclusive('\n').scan(0usize, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    });

    match offsets.next() {
        Some((_, first)) if first.trim_end() == "---" => {}
        _ => return without,
    }

    // Scan for a closing fence occupying a whole line.
    let mut yaml_start = None;
    for (line_number, (start, line)) in offsets.enumerate() {
        if yaml_start.is_none() {
            yaml_start = Some(start);
        }
        if line.trim_end() == "---" {
            let yaml = &text[yaml_start.unwrap()..start];
            let body = &text[start + line.len()..];
            // opening fence is line 1, this fence is line `line_number + 2`
            let body_first_line = line_number + 3;
            // serde_yaml rejects a fully empty document, but an empty block
            // should behave like one with every key missing.
            let frontmatter = match serde_yaml::from_str::<RawFrontmatter>(if yaml.trim().is_empty() {
                "{}"
            } else {
                yaml
            }) {
                Ok(raw) => typecheck(path, raw, diags),
                Err(err) => {
                    diags.push(
                        ContentError::error(path, format!("malformed frontmatter: {}", err))
                            .at_line(1),
                    );
                    Frontmatter::default()
                }
            };
            return SplitDocument {
                frontmatter,
                body,
                body_first_line,
            };
        }
    }

    diags.push(ContentError::error(path, "frontmatter block is never closed with `---`").at_line(1));
    without
}

fn typecheck(path: &str, raw: RawFrontmatter, diags: &mut Diagnostics) -> Frontmatter {
    let kind = match raw.kind.as_deref() {
        Some(value) => {
            let parsed = DocumentKind::parse(value);
            if parsed.is_none() {
                diags.push(
                    ContentError::error(
                        path,
                        format!(
                            "unknown document kind `{}` in frontmatter; expected \
                             course, module, learning-outcome, or lens",
                            value
                        ),
                    )
                    .at_line(1),
                );
            }
            parsed
        }
        None => {
            diags.push(
                ContentError::error(path, "frontmatter is missing required key `kind`").at_line(1),
            );
            None
        }
    };

    let tier = match raw.tier.as_deref() {
        Some(value) => {
            let parsed = Tier::parse(value);
            if parsed.is_none() {
                diags.push(
                    ContentError::error(
                        path,
                        format!(
                            "unknown tier `{}` in frontmatter; expected draft, review, \
                             or production",
                            value
                        ),
                    )
                    .at_line(1),
                );
            }
            parsed
        }
        None => None,
    };

    Frontmatter {
        kind,
        slug: raw.slug,
        title: raw.title,
        id: raw.id,
        tier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_ok(text: &str) -> (Frontmatter, String, usize) {
        let mut diags = Diagnostics::new();
        let doc = split("doc.md", text, &mut diags);
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
        (doc.frontmatter, doc.body.to_string(), doc.body_first_line)
    }

    #[test]
    fn test_full_block() {
        let text = "---\nkind: module\nslug: my-cool-module\ntitle: My Cool Module\ntier: draft\n---\n# Page: Hello\n";
        let (fm, body, first_line) = split_ok(text);
        assert_eq!(fm.kind, Some(DocumentKind::Module));
        assert_eq!(fm.slug.as_deref(), Some("my-cool-module"));
        assert_eq!(fm.tier, Some(Tier::Draft));
        assert_eq!(body, "# Page: Hello\n");
        // ---, four keys, --- puts the body on line 7
        assert_eq!(first_line, 7);
    }

    #[test]
    fn test_no_frontmatter() {
        let mut diags = Diagnostics::new();
        let doc = split("doc.md", "# Page: Hello\n", &mut diags);
        assert!(diags.is_empty());
        assert_eq!(doc.frontmatter, Frontmatter::default());
        assert_eq!(doc.body_first_line, 1);
    }

    #[test]
    fn test_unclosed_block_is_an_error() {
        let mut diags = Diagnostics::new();
        let doc = split("doc.md", "---\nkind: module\n", &mut diags);
        assert!(diags.has_errors());
        assert_eq!(doc.frontmatter, Frontmatter::default());
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let mut diags = Diagnostics::new();
        let doc = split("doc.md", "---\nkind: worksheet\n---\n", &mut diags);
        assert!(diags.has_errors());
        assert_eq!(doc.frontmatter.kind, None);
        let message = &diags.iter().next().unwrap().message;
        assert!(message.contains("worksheet"));
    }

    #[test]
    fn test_missing_kind_is_an_error() {
        let mut diags = Diagnostics::new();
        split("doc.md", "---\ntitle: Untyped\n---\n", &mut diags);
        assert!(diags.has_errors());
    }

    #[test]
    fn test_unknown_extra_keys_are_tolerated() {
        let text = "---\nkind: lens\neditor-color: teal\n---\n";
        let mut diags = Diagnostics::new();
        let doc = split("doc.md", text, &mut diags);
        assert!(diags.is_empty());
        assert_eq!(doc.frontmatter.kind, Some(DocumentKind::Lens));
    }

    #[test]
    fn test_malformed_yaml_is_an_error_not_a_panic() {
        let text = "---\nkind: [unclosed\n---\n";
        let mut diags = Diagnostics::new();
        let doc = split("doc.md", text, &mut diags);
        assert!(diags.has_errors());
        assert_eq!(doc.frontmatter, Frontmatter::default());
    }
}
