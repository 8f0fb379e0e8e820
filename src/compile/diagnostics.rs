//! Author-facing diagnostics
//!
//! Diagnostics are the compiler's primary user interface: authors run the
//! pipeline repeatedly and fix what it reports. They are collected across
//! the whole run and emitted in discovery order; one malformed document must
//! never prevent the rest of the vault from compiling, so nothing in the
//! pipeline throws for content problems.
//!
//! The collector is passed by `&mut` through every phase rather than living
//! in global state, which keeps parallel test runs isolated.

use serde::Serialize;
use std::fmt;

/// Diagnostic severity.
///
/// `Error` means structural integrity is violated (dangling reference,
/// illegal header placement, missing required field, tier violation) and the
/// vault should not be published. `Warning` is advisory (likely typo,
/// unreachable URL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One diagnostic. Always carries the originating file; carries a line
/// number whenever the detecting component has line-level context (parser
/// errors generally do, cross-file resolution errors generally do not).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentError {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub severity: Severity,
}

impl ContentError {
    pub fn error(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            message: message.into(),
            suggestion: None,
            severity: Severity::Error,
        }
    }

    pub fn warning(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(file, message)
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.file)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Write-only diagnostics collector threaded through every phase.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<ContentError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: ContentError) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = ContentError>) {
        self.items.extend(diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if any collected diagnostic is `error`-severity. Warnings alone
    /// never make a vault unpublishable.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentError> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<ContentError> {
        self.items
    }
}
