//! Slug normalization
//!
//! Slugs are the URL-safe identifiers the runtime API addresses content by.
//! Authors may declare one in frontmatter; when they don't, one is derived
//! from the document title or, failing that, the filename stem.

/// Normalize a title or filename into a URL-safe slug.
///
/// Lowercases, maps every run of non-alphanumeric characters to a single
/// `-`, and trims leading/trailing dashes. Idempotent: normalizing a slug
/// returns it unchanged.
pub fn normalize(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            // Lowercasing can expand to multiple chars ('İ' adds a combining
            // mark); keep only the alphanumeric ones so the result is stable
            // under re-normalization.
            for lower in ch.to_lowercase().filter(|c| c.is_alphanumeric()) {
                slug.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// The filename stem of a vault-relative path, without extension.
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}
