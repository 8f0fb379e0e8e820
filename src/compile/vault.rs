//! Vault input
//!
//! A vault is a directory tree of UTF-8 text documents. Directories whose
//! name contains "wip" (case-insensitive) are work-in-progress and skipped
//! entirely. For integration use, a pre-assembled `{path: text}` JSON map
//! can be read from standard input instead of walking a directory.
//!
//! Unreadable vaults are the one catastrophic failure of the whole program
//! and surface as [`VaultError`]; individual unreadable or non-UTF-8 files
//! only produce diagnostics.

use crate::compile::diagnostics::{ContentError, Diagnostics};
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Vault-relative path → document text. BTreeMap so iteration (and
/// therefore compilation) order is deterministic.
pub type FileMap = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("vault path `{0}` is not a readable directory")]
    NotADirectory(PathBuf),
    #[error("failed to read vault: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid file map on stdin: {0}")]
    InvalidFileMap(#[from] serde_json::Error),
}

/// Recursively read every `.{extension}` file under `root`, skipping
/// work-in-progress subtrees.
pub fn read_vault(
    root: &Path,
    extension: &str,
    diags: &mut Diagnostics,
) -> Result<FileMap, VaultError> {
    if !root.is_dir() {
        return Err(VaultError::NotADirectory(root.to_path_buf()));
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir && is_wip(&entry.file_name().to_string_lossy()))
        })
        .build();

    let mut files = FileMap::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                diags.push(ContentError::error(
                    root.to_string_lossy(),
                    format!("failed to walk vault entry: {}", err),
                ));
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        let relative = relative_slash_path(root, path);
        match std::fs::read(path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => {
                    files.insert(relative, text);
                }
                Err(_) => diags.push(ContentError::error(
                    relative,
                    "file is not valid UTF-8 and was skipped",
                )),
            },
            Err(err) => diags.push(ContentError::error(
                relative,
                format!("file could not be read and was skipped: {}", err),
            )),
        }
    }
    debug!(files = files.len(), "vault read");
    Ok(files)
}

/// Read a `{path: text}` JSON object from a reader (the `--stdin-map`
/// integration mode).
pub fn read_file_map(mut reader: impl Read) -> Result<FileMap, VaultError> {
    let mut buffer = String::new();
    reader.read_to_string(&mut buffer)?;
    Ok(serde_json::from_str(&buffer)?)
}

fn is_wip(name: &str) -> bool {
    name.to_ascii_lowercase().contains("wip")
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_wip_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("modules")).unwrap();
        fs::create_dir_all(dir.path().join("WIP-drafts")).unwrap();
        fs::write(dir.path().join("modules/a.md"), "hello").unwrap();
        fs::write(dir.path().join("WIP-drafts/b.md"), "draft").unwrap();

        let mut diags = Diagnostics::new();
        let files = read_vault(dir.path(), "md", &mut diags).unwrap();
        assert!(diags.is_empty());
        assert_eq!(files.len(), 1);
        assert!(files.contains_key("modules/a.md"));
    }

    #[test]
    fn test_only_matching_extension_is_read() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "doc").unwrap();
        fs::write(dir.path().join("b.txt"), "not a doc").unwrap();

        let mut diags = Diagnostics::new();
        let files = read_vault(dir.path(), "md", &mut diags).unwrap();
        assert_eq!(files.keys().collect::<Vec<_>>(), vec!["a.md"]);
    }

    #[test]
    fn test_non_utf8_file_is_a_diagnostic_not_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.md"), [0xff, 0xfe, 0x00]).unwrap();

        let mut diags = Diagnostics::new();
        let files = read_vault(dir.path(), "md", &mut diags).unwrap();
        assert!(files.is_empty());
        assert!(diags.has_errors());
    }

    #[test]
    fn test_missing_vault_is_catastrophic() {
        let mut diags = Diagnostics::new();
        let result = read_vault(Path::new("/no/such/vault"), "md", &mut diags);
        assert!(matches!(result, Err(VaultError::NotADirectory(_))));
    }

    #[test]
    fn test_read_file_map() {
        let json = r##"{"modules/a.md": "# Page: A", "courses/c.md": "# Progression"}"##;
        let files = read_file_map(json.as_bytes()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files["modules/a.md"], "# Page: A");
    }

    #[test]
    fn test_malformed_file_map_is_an_error() {
        assert!(read_file_map("not json".as_bytes()).is_err());
    }
}
