//! Cross-file reference resolution
//!
//! Wiki-references are resolved through owned lookup tables rather than
//! live references between documents: the resolver copies identifiers out
//! of each parsed document into slug→path and path→slug maps, then answers
//! lookups against those. The reverse (path→slug) map is authoritative —
//! slug collisions are common in authoring and only the reverse map
//! survives them uniquely per path.
//!
//! Resolution order for a reference: normalize against the referencing
//! file's directory and look up the exact path; then try the reference as a
//! vault-root-relative path; then fall back to matching the filename stem
//! across all known documents. The stem fallback can match an unintended
//! same-stem file in another directory; matches are taken in sorted path
//! order to keep the outcome deterministic.

use crate::compile::diagnostics::{ContentError, Diagnostics};
use crate::compile::parsing::RawDocument;
use crate::compile::slug;
use std::collections::BTreeMap;

/// Owned slug↔path lookup tables for one compilation run.
#[derive(Debug, Default)]
pub struct ResolutionTable {
    slug_to_path: BTreeMap<String, String>,
    path_to_slug: BTreeMap<String, String>,
}

impl ResolutionTable {
    /// Build both maps in one pass over all parsed documents. Duplicate
    /// slugs are tolerated — first document in path order wins the forward
    /// map — and reported as warnings.
    pub fn build(docs: &BTreeMap<String, RawDocument>, diags: &mut Diagnostics) -> Self {
        let mut table = ResolutionTable::default();
        for (path, doc) in docs {
            let slug = document_slug(path, doc);
            if slug.is_empty() {
                diags.push(ContentError::error(
                    path,
                    "could not derive a slug from the frontmatter, title, or filename",
                ));
                continue;
            }
            if let Some(existing) = table.slug_to_path.get(&slug) {
                diags.push(ContentError::warning(
                    path,
                    format!(
                        "slug `{}` is already declared by {}; slug lookups resolve to that file",
                        slug, existing
                    ),
                ));
            } else {
                table.slug_to_path.insert(slug.clone(), path.clone());
            }
            table.path_to_slug.insert(path.clone(), slug);
        }
        table
    }

    /// The slug of a known document path. Authoritative per path even when
    /// slugs collide.
    pub fn slug_of(&self, path: &str) -> Option<&str> {
        self.path_to_slug.get(path).map(String::as_str)
    }

    /// Resolve a wiki-reference from `from_path` to a known document path.
    pub fn resolve(&self, reference: &str, from_path: &str) -> Option<&str> {
        let target = with_extension(reference.trim());

        let relative = normalize_path(&join(parent(from_path), &target));
        if let Some((path, _)) = self.path_to_slug.get_key_value(relative.as_str()) {
            return Some(path.as_str());
        }

        let rooted = normalize_path(&target);
        if let Some((path, _)) = self.path_to_slug.get_key_value(rooted.as_str()) {
            return Some(path.as_str());
        }

        // Fallback: match by filename stem across all known documents.
        let stem = slug::file_stem(&target);
        self.path_to_slug
            .keys()
            .find(|path| slug::file_stem(path) == stem)
            .map(String::as_str)
    }

    /// Emit the standard unresolved-reference error and drop marker.
    pub fn report_unresolved(
        &self,
        reference: &str,
        from_path: &str,
        line: Option<usize>,
        diags: &mut Diagnostics,
    ) {
        let mut diag = ContentError::error(
            from_path,
            format!("reference `[[{}]]` could not be resolved", reference),
        )
        .with_suggestion("check that the target file exists and the path is spelled correctly");
        if let Some(line) = line {
            diag = diag.at_line(line);
        }
        diags.push(diag);
    }
}

/// The slug a document is addressed by: declared in frontmatter, derived
/// from the title, or derived from the filename stem.
pub fn document_slug(path: &str, doc: &RawDocument) -> String {
    if let Some(declared) = &doc.frontmatter.slug {
        return declared.trim().to_string();
    }
    if let Some(title) = &doc.frontmatter.title {
        let derived = slug::normalize(title);
        if !derived.is_empty() {
            return derived;
        }
    }
    slug::normalize(slug::file_stem(path))
}

fn with_extension(reference: &str) -> String {
    let name = reference.rsplit('/').next().unwrap_or(reference);
    if name.contains('.') {
        reference.to_string()
    } else {
        format!("{}.md", reference)
    }
}

fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

fn join(dir: &str, target: &str) -> String {
    if dir.is_empty() {
        target.to_string()
    } else {
        format!("{}/{}", dir, target)
    }
}

/// Collapse `.` and `..` components of a vault-relative path.
fn normalize_path(path: &str) -> String {
    let mut components: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    components.join("/")
}
