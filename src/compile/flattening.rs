//! Module flattening
//!
//! Expands a module's outline into one flat, ordered section list. Pages
//! pass through unchanged; learning-outcome and uncategorized sections load
//! the documents they reference and inline each referenced lens's single
//! video/article section, tagged with the owning learning outcome's
//! identifier (or explicitly none for uncategorized material).
//!
//! The module → learning outcome → lens hierarchy exists only here; nothing
//! of it survives into the compiled output. Any missing document at any
//! level is an `error`; the affected entry is excluded, the module is marked
//! with a warning, and the run continues.

use crate::compile::diagnostics::{ContentError, Diagnostics};
use crate::compile::fields;
use crate::compile::frontmatter::DocumentKind;
use crate::compile::model::Module;
use crate::compile::parsing::{RawDocument, RawSection, RawSectionKind};
use crate::compile::resolving::{document_slug, ResolutionTable};
use crate::compile::slug;
use std::collections::BTreeMap;

/// Flatten one module document against the fully parsed vault.
pub fn flatten_module(
    doc: &RawDocument,
    docs: &BTreeMap<String, RawDocument>,
    table: &ResolutionTable,
    diags: &mut Diagnostics,
) -> Module {
    let mut module = Module {
        slug: table
            .slug_of(&doc.path)
            .map(str::to_string)
            .unwrap_or_else(|| document_slug(&doc.path, doc)),
        title: doc
            .frontmatter
            .title
            .clone()
            .unwrap_or_else(|| slug::file_stem(&doc.path).to_string()),
        id: doc.frontmatter.id.clone(),
        sections: Vec::new(),
        warnings: Vec::new(),
    };

    for section in &doc.sections {
        match section.kind {
            RawSectionKind::Page => flatten_page(doc, section, &mut module, diags),
            RawSectionKind::LearningOutcome => {
                flatten_outcome(doc, section, docs, table, &mut module, diags)
            }
            RawSectionKind::Uncategorized => {
                flatten_uncategorized(doc, section, docs, table, &mut module, diags)
            }
            // Placement violations were reported during validation.
            _ => {}
        }
    }
    module
}

fn flatten_page(
    doc: &RawDocument,
    section: &RawSection,
    module: &mut Module,
    diags: &mut Diagnostics,
) {
    let Some(page) = fields::materialize_section(section) else {
        return;
    };
    if page.segments.is_empty() {
        diags.push(
            ContentError::error(
                &doc.path,
                format!(
                    "page `{}` has no segments and cannot be rendered",
                    page.title.as_deref().unwrap_or("(untitled)")
                ),
            )
            .at_line(section.line),
        );
        module
            .warnings
            .push(format!("excluded empty page at line {}", section.line));
        return;
    }
    module.sections.push(page);
}

fn flatten_outcome(
    doc: &RawDocument,
    section: &RawSection,
    docs: &BTreeMap<String, RawDocument>,
    table: &ResolutionTable,
    module: &mut Module,
    diags: &mut Diagnostics,
) {
    let Some(outcome) = load_reference(
        doc,
        section,
        docs,
        table,
        DocumentKind::LearningOutcome,
        module,
        diags,
    ) else {
        return;
    };

    // The learning-outcome identity every inlined section is tagged with.
    let outcome_id = outcome
        .frontmatter
        .id
        .clone()
        .unwrap_or_else(|| document_slug(&outcome.path, outcome));

    for lens_ref in outcome.sections_of_kind(RawSectionKind::LensRef) {
        let Some(lens) = load_reference(
            outcome,
            lens_ref,
            docs,
            table,
            DocumentKind::Lens,
            module,
            diags,
        ) else {
            continue;
        };
        inline_lens(lens, Some(outcome_id.clone()), module, diags);
    }
}

fn flatten_uncategorized(
    doc: &RawDocument,
    section: &RawSection,
    docs: &BTreeMap<String, RawDocument>,
    table: &ResolutionTable,
    module: &mut Module,
    diags: &mut Diagnostics,
) {
    for field in section.field_values("ref") {
        let Some(target) = crate::compile::lexing::wikilink_target(&field.value) else {
            diags.push(
                ContentError::error(
                    &doc.path,
                    format!("`ref::` expects a wikilink, got `{}`", field.value),
                )
                .at_line(field.line),
            );
            continue;
        };
        let Some(lens) = resolve_to_kind(
            &target,
            &doc.path,
            Some(field.line),
            docs,
            table,
            DocumentKind::Lens,
            module,
            diags,
        ) else {
            continue;
        };
        inline_lens(lens, None, module, diags);
    }
}

/// Resolve the single `ref::` of a learning-outcome or lens-reference
/// section to a document of the expected kind.
fn load_reference<'d>(
    doc: &RawDocument,
    section: &RawSection,
    docs: &'d BTreeMap<String, RawDocument>,
    table: &ResolutionTable,
    expected: DocumentKind,
    module: &mut Module,
    diags: &mut Diagnostics,
) -> Option<&'d RawDocument> {
    let field = section.field("ref")?;
    let Some(target) = crate::compile::lexing::wikilink_target(&field.value) else {
        diags.push(
            ContentError::error(
                &doc.path,
                format!("`ref::` expects a wikilink, got `{}`", field.value),
            )
            .at_line(field.line),
        );
        return None;
    };
    resolve_to_kind(
        &target,
        &doc.path,
        Some(field.line),
        docs,
        table,
        expected,
        module,
        diags,
    )
}

#[allow(clippy::too_many_arguments)]
fn resolve_to_kind<'d>(
    target: &str,
    from_path: &str,
    line: Option<usize>,
    docs: &'d BTreeMap<String, RawDocument>,
    table: &ResolutionTable,
    expected: DocumentKind,
    module: &mut Module,
    diags: &mut Diagnostics,
) -> Option<&'d RawDocument> {
    let Some(path) = table.resolve(target, from_path) else {
        table.report_unresolved(target, from_path, line, diags);
        module
            .warnings
            .push(format!("excluded unresolved reference `[[{}]]`", target));
        return None;
    };
    let resolved = docs.get(path)?;
    if resolved.frontmatter.kind != Some(expected) {
        diags.push(ContentError::error(
            from_path,
            format!(
                "reference `[[{}]]` resolved to {}, which is not a {} document",
                target,
                path,
                expected.as_str()
            ),
        ));
        module.warnings.push(format!(
            "excluded reference `[[{}]]` of unexpected kind",
            target
        ));
        return None;
    }
    Some(resolved)
}

/// Inline a lens document's single video/article section, tagging it with
/// the owning learning outcome (or none).
fn inline_lens(
    lens: &RawDocument,
    learning_outcome: Option<String>,
    module: &mut Module,
    diags: &mut Diagnostics,
) {
    let mut media = lens.sections.iter().filter(|section| {
        matches!(
            section.kind,
            RawSectionKind::Video | RawSectionKind::Article
        )
    });
    let (Some(section), None) = (media.next(), media.next()) else {
        // The lens's own validation already reported the malformed shape.
        module
            .warnings
            .push(format!("excluded malformed lens {}", lens.path));
        return;
    };
    let Some(mut materialized) = fields::materialize_section(section) else {
        module
            .warnings
            .push(format!("excluded malformed lens {}", lens.path));
        return;
    };
    if materialized.segments.is_empty() {
        diags.push(
            ContentError::error(
                &lens.path,
                "lens media section has no segments and cannot be rendered",
            )
            .at_line(section.line),
        );
        module
            .warnings
            .push(format!("excluded empty lens {}", lens.path));
        return;
    }
    materialized.learning_outcome = learning_outcome;
    module.sections.push(materialized);
}
