//! Pipeline orchestrator
//!
//! Drives the phases in dependency order over a whole vault:
//!
//!     phase one  — parse and field-validate every document independently
//!     phase two  — build the resolution and tier tables, compile courses,
//!                  flatten modules, cross-check tiers
//!
//! Phase one has no inter-document dependencies; phase two only reads the
//! tables built from phase one's results. Everything here is synchronous —
//! the URL reachability validator consumes the records extracted here but
//! runs separately (see [linkcheck](crate::compile::linkcheck)).
//!
//! The orchestrator is stateless across runs: identical input yields
//! byte-identical output.

use crate::compile::diagnostics::{ContentError, Diagnostics};
use crate::compile::fields;
use crate::compile::flattening;
use crate::compile::frontmatter::DocumentKind;
use crate::compile::lexing;
use crate::compile::linkcheck::UrlRecord;
use crate::compile::model::{Course, Module, ProgressionItem};
use crate::compile::parsing::{self, RawDocument, RawSectionKind};
use crate::compile::resolving::ResolutionTable;
use crate::compile::tiers::{self, TierMap};
use crate::compile::vault::FileMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// The compiled output: the sole contract runtime consumers depend on.
/// Diagnostics of both severities are interleaved in discovery order.
#[derive(Debug, Serialize)]
pub struct CompiledVault {
    pub modules: Vec<Module>,
    pub courses: Vec<Course>,
    pub errors: Vec<ContentError>,
}

impl CompiledVault {
    /// Stable pretty JSON with a trailing newline.
    pub fn to_json(&self) -> String {
        let mut json =
            serde_json::to_string_pretty(self).expect("compiled output serializes to JSON");
        json.push('\n');
        json
    }
}

/// Compile a whole vault. Returns the output plus the URL records for the
/// optional reachability pass.
pub fn compile(files: &FileMap) -> (CompiledVault, Vec<UrlRecord>) {
    compile_with_diagnostics(files, Diagnostics::new())
}

/// Compile with pre-collected diagnostics (e.g. unreadable files reported
/// by the vault reader), which stay first in discovery order.
pub fn compile_with_diagnostics(
    files: &FileMap,
    diags: Diagnostics,
) -> (CompiledVault, Vec<UrlRecord>) {
    let mut diags = diags;

    // Phase one: each document parses independently.
    let mut docs: BTreeMap<String, RawDocument> = BTreeMap::new();
    for (path, text) in files {
        let doc = parsing::parse_document(path, text, &mut diags);
        fields::validate_document(&doc, &mut diags);
        docs.insert(path.clone(), doc);
    }
    debug!(documents = docs.len(), "phase one complete");

    // Phase two: global tables, then resolution-dependent compilation.
    let table = ResolutionTable::build(&docs, &mut diags);
    let tier_map = build_tier_map(&docs);
    let url_records = extract_url_records(&docs);

    let mut modules = Vec::new();
    let mut courses = Vec::new();
    for doc in docs.values() {
        match doc.frontmatter.kind {
            Some(DocumentKind::Module) => {
                modules.push(flattening::flatten_module(doc, &docs, &table, &mut diags));
            }
            Some(DocumentKind::Course) => {
                courses.push(compile_course(doc, &docs, &table, &tier_map, &mut diags));
            }
            _ => {}
        }
    }
    debug!(
        modules = modules.len(),
        courses = courses.len(),
        diagnostics = diags.len(),
        "phase two complete"
    );

    (
        CompiledVault {
            modules,
            courses,
            errors: diags.into_vec(),
        },
        url_records,
    )
}

fn build_tier_map(docs: &BTreeMap<String, RawDocument>) -> TierMap {
    docs.iter()
        .filter_map(|(path, doc)| doc.frontmatter.tier.map(|tier| (path.clone(), tier)))
        .collect()
}

/// Collect `source::` occurrences for the reachability validator.
fn extract_url_records(docs: &BTreeMap<String, RawDocument>) -> Vec<UrlRecord> {
    let mut records = Vec::new();
    for (path, doc) in docs {
        for section in &doc.sections {
            for field in section.field_values("source") {
                records.push(UrlRecord {
                    url: field.value.clone(),
                    file: path.clone(),
                    line: field.line,
                    label: section
                        .title
                        .clone()
                        .unwrap_or_else(|| section.kind.keyword().to_string()),
                });
            }
        }
    }
    records
}

/// Compile a course's progression, resolving module references to slugs and
/// cross-checking tiers along each resolved edge. Unresolved or malformed
/// entries are dropped after an error is emitted, never left dangling.
fn compile_course(
    doc: &RawDocument,
    docs: &BTreeMap<String, RawDocument>,
    table: &ResolutionTable,
    tier_map: &TierMap,
    diags: &mut Diagnostics,
) -> Course {
    let mut progression = Vec::new();

    for section in doc.sections_of_kind(RawSectionKind::Progression) {
        for item in &section.items {
            if item.text.trim().eq_ignore_ascii_case("meeting") {
                progression.push(ProgressionItem::Meeting);
                continue;
            }
            let Some(target) = lexing::wikilink_target(&item.text) else {
                diags.push(
                    ContentError::error(
                        &doc.path,
                        format!(
                            "progression item `{}` must be a `[[wikilink]]` or `meeting`",
                            item.text
                        ),
                    )
                    .at_line(item.line),
                );
                continue;
            };
            let Some(module_path) = table.resolve(&target, &doc.path) else {
                table.report_unresolved(&target, &doc.path, Some(item.line), diags);
                continue;
            };
            let module_path = module_path.to_string();
            if docs.get(&module_path).and_then(|d| d.frontmatter.kind)
                != Some(DocumentKind::Module)
            {
                diags.push(
                    ContentError::error(
                        &doc.path,
                        format!(
                            "progression reference `[[{}]]` resolved to {}, which is not a module",
                            target, module_path
                        ),
                    )
                    .at_line(item.line),
                );
                continue;
            }
            let Some(slug) = table.slug_of(&module_path) else {
                continue;
            };
            tiers::check_edge(tier_map, &doc.path, &module_path, diags);
            progression.push(ProgressionItem::Module {
                slug: slug.to_string(),
                optional: item.text.to_ascii_lowercase().contains("(optional)"),
            });
        }
    }

    Course {
        slug: table
            .slug_of(&doc.path)
            .map(str::to_string)
            .unwrap_or_default(),
        title: doc.frontmatter.title.clone().unwrap_or_default(),
        progression,
    }
}
