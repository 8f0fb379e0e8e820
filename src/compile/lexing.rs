//! Line lexer and classification for the authoring dialect
//!
//! The dialect is line-oriented: every line of a document body is one of a
//! small set of shapes (header, field, list item, blank, plain text). Each
//! line is tokenized with a logos lexer, then classified from its token
//! pattern. The parser assembles sections and segments from the classified
//! stream; nothing here looks across lines.
//!
//! Single-colon lines (`key: value`) are classified as *candidates* rather
//! than errors. Whether one is a botched field (`summary: ...` inside a
//! text segment) or ordinary prose ("Note: bring a laptop") depends on the
//! enclosing block's legal field set, which only the parser knows.

use logos::Logos;
use once_cell::sync::Lazy;
use regex::Regex;

/// Tokens of one line. Every character of the input is covered by some
/// pattern, so lexing never fails.
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token {
    /// A run of `#` header marks; carries the run length (header depth).
    #[regex(r"#+", |lex| lex.slice().len())]
    Hashes(usize),

    /// `\#`: an escaped literal hash at the start of a value line.
    #[token("\\#")]
    EscapedHash,

    #[token("::")]
    FieldMarker,

    #[token(":")]
    Colon,

    #[token("[[")]
    WikiOpen,

    #[token("]]")]
    WikiClose,

    #[token("[")]
    OpenBracket,

    #[token("]")]
    CloseBracket,

    #[token("-")]
    Dash,

    #[token("\\")]
    Backslash,

    #[regex(r"[ \t]+")]
    Whitespace,

    /// Any other run of characters.
    #[regex(r"[^ \t:#\[\]\\\-]+")]
    Word,
}

/// Tokenize one line (no trailing newline) into tokens with byte spans.
pub fn tokenize(line: &str) -> Vec<(Token, std::ops::Range<usize>)> {
    let mut lexer = Token::lexer(line);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        if let Ok(token) = result {
            tokens.push((token, lexer.span()));
        }
    }
    tokens
}

/// The classified shape of one line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// `#`-run at line start: a section (depth 1) or segment (depth 2)
    /// header. `text` is everything after the marks, trimmed.
    Header { depth: usize, text: String },
    /// `key:: value` — value holds only the first-line remainder.
    Field { key: String, value: String },
    /// `key: value` — possibly a field typed with a single colon, possibly
    /// prose. The parser decides.
    SingleColonCandidate { key: String, value: String },
    /// `- item` — a dash list entry (course progressions).
    ListItem { text: String },
    Blank,
    /// Anything else, with a leading `\#` escape already stripped.
    Text { content: String },
}

/// Classify one raw line from its token pattern.
pub fn classify(line: &str) -> LineKind {
    let tokens = tokenize(line);

    if tokens
        .iter()
        .all(|(token, _)| matches!(token, Token::Whitespace))
    {
        return LineKind::Blank;
    }

    match &tokens[0] {
        (Token::Hashes(depth), span) => {
            let text = line[span.end..].trim().to_string();
            return LineKind::Header {
                depth: *depth,
                text,
            };
        }
        (Token::EscapedHash, span) => {
            // Strip the backslash, keep the hash and the rest of the line.
            let content = format!("#{}", &line[span.end..]);
            return LineKind::Text { content };
        }
        _ => {}
    }

    if let Some((key, next)) = leading_key(line, &tokens) {
        match tokens.get(next) {
            Some((Token::FieldMarker, span)) => {
                return LineKind::Field {
                    key,
                    value: line[span.end..].trim().to_string(),
                };
            }
            Some((Token::Colon, span)) => {
                let rest_is_clear = match tokens.get(next + 1) {
                    None => true,
                    Some((Token::Whitespace, _)) => true,
                    _ => false,
                };
                if rest_is_clear {
                    return LineKind::SingleColonCandidate {
                        key,
                        value: line[span.end..].trim().to_string(),
                    };
                }
            }
            _ => {}
        }
    }

    if let (Some((Token::Dash, _)), Some((Token::Whitespace, span))) =
        (tokens.first(), tokens.get(1))
    {
        return LineKind::ListItem {
            text: line[span.end..].trim().to_string(),
        };
    }

    LineKind::Text {
        content: line.to_string(),
    }
}

/// Match a field-key shape at the start of the token stream: a word at
/// column zero, optionally continued by dash-word pairs (`student-visible`).
/// Returns the key text and the index of the token right after it.
fn leading_key(
    line: &str,
    tokens: &[(Token, std::ops::Range<usize>)],
) -> Option<(String, usize)> {
    let (Token::Word, first) = &tokens[0] else {
        return None;
    };
    if first.start != 0 {
        return None;
    }
    let mut end = first.end;
    let mut idx = 1;
    while let (Some((Token::Dash, _)), Some((Token::Word, word))) =
        (tokens.get(idx), tokens.get(idx + 1))
    {
        end = word.end;
        idx += 2;
    }
    Some((line[..end].to_string(), idx))
}

/// `[[target]]` anywhere in a line.
pub static WIKILINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]]+)\]\]").expect("wikilink pattern compiles"));

/// Extract the first wikilink target from `text`, trimmed.
pub fn wikilink_target(text: &str) -> Option<String> {
    WIKILINK
        .captures(text)
        .map(|captures| captures[1].trim().to_string())
}

/// Strip the `\#` escape from a value continuation line, if present.
pub fn materialize_value_line(line: &str) -> String {
    match line.strip_prefix('\\') {
        Some(rest) if rest.starts_with('#') => rest.to_string(),
        _ => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_line() {
        assert_eq!(
            classify("# Page: Welcome"),
            LineKind::Header {
                depth: 1,
                text: "Page: Welcome".to_string()
            }
        );
        assert_eq!(
            classify("## Video-excerpt"),
            LineKind::Header {
                depth: 2,
                text: "Video-excerpt".to_string()
            }
        );
    }

    #[test]
    fn test_field_line() {
        assert_eq!(
            classify("source:: https://example.com/video"),
            LineKind::Field {
                key: "source".to_string(),
                value: "https://example.com/video".to_string()
            }
        );
    }

    #[test]
    fn test_dashed_field_key() {
        assert_eq!(
            classify("student-visible:: yes"),
            LineKind::Field {
                key: "student-visible".to_string(),
                value: "yes".to_string()
            }
        );
    }

    #[test]
    fn test_field_with_empty_value() {
        assert_eq!(
            classify("content::"),
            LineKind::Field {
                key: "content".to_string(),
                value: String::new()
            }
        );
    }

    #[test]
    fn test_single_colon_candidate() {
        assert_eq!(
            classify("content: the value"),
            LineKind::SingleColonCandidate {
                key: "content".to_string(),
                value: "the value".to_string()
            }
        );
    }

    #[test]
    fn test_url_in_prose_is_not_a_colon_candidate() {
        // `https://…` has no whitespace after the colon, so it stays text.
        assert_eq!(
            classify("https://example.com"),
            LineKind::Text {
                content: "https://example.com".to_string()
            }
        );
    }

    #[test]
    fn test_prose_with_colon_is_a_candidate() {
        // "Note: bring a laptop" matches the candidate shape; the parser
        // keeps it as text unless `note` is close to a legal field name.
        assert_eq!(
            classify("Note: bring a laptop"),
            LineKind::SingleColonCandidate {
                key: "Note".to_string(),
                value: "bring a laptop".to_string()
            }
        );
    }

    #[test]
    fn test_list_item() {
        assert_eq!(
            classify("- [[modules/My Cool Module]] (optional)"),
            LineKind::ListItem {
                text: "[[modules/My Cool Module]] (optional)".to_string()
            }
        );
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("   \t "), LineKind::Blank);
    }

    #[test]
    fn test_escaped_hash_becomes_text() {
        assert_eq!(
            classify("\\# not a header"),
            LineKind::Text {
                content: "# not a header".to_string()
            }
        );
    }

    #[test]
    fn test_indented_hash_is_text() {
        assert_eq!(
            classify("  # indented"),
            LineKind::Text {
                content: "  # indented".to_string()
            }
        );
    }

    #[test]
    fn test_wikilink_target() {
        assert_eq!(
            wikilink_target("see [[modules/Intro]] for details"),
            Some("modules/Intro".to_string())
        );
        assert_eq!(wikilink_target("no links here"), None);
    }

    #[test]
    fn test_materialize_value_line() {
        assert_eq!(materialize_value_line("\\# heading in value"), "# heading in value");
        assert_eq!(materialize_value_line("plain"), "plain");
        assert_eq!(materialize_value_line("\\n not an escape"), "\\n not an escape");
    }
}
