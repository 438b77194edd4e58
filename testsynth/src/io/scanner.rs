//! Source discovery for the target repository.
//!
//! Walks the target root and yields Python source files that are candidates
//! for extraction, excluding generated test files: everything under the
//! tests directory plus any file following the `test_*.py` naming.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// One discovered source file with its dotted module path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Dotted module path relative to the root (`pkg/util.py` -> `pkg.util`).
    pub module: String,
}

/// Discover source files under `root`, in deterministic (sorted) order.
///
/// Unreadable entries are skipped with a warning; discovery never aborts the
/// run. Hidden directories and `__pycache__` are pruned.
pub fn scan_sources(root: &Path, tests_dir: &str) -> Result<Vec<ScannedFile>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| keep_entry(entry, tests_dir));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.ends_with(".py") || file_name.starts_with("test_") {
            continue;
        }
        let rel = path.strip_prefix(root).unwrap_or(path);
        let Some(module) = module_name(rel) else {
            warn!(path = %path.display(), "cannot derive module name, skipping");
            continue;
        };
        files.push(ScannedFile {
            path: path.to_path_buf(),
            module,
        });
    }

    files.sort();
    Ok(files)
}

fn keep_entry(entry: &DirEntry, tests_dir: &str) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    if name.starts_with('.') || name == "__pycache__" {
        return false;
    }
    // Generated tests live directly under the root; never rescan them.
    if entry.depth() == 1 && entry.file_type().is_dir() && name == tests_dir {
        return false;
    }
    true
}

/// Derive the dotted module path from a root-relative file path.
///
/// `__init__.py` maps to its package (`pkg/__init__.py` -> `pkg`); a
/// root-level `__init__.py` has no importable name and yields `None`.
fn module_name(rel: &Path) -> Option<String> {
    let mut parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let file = parts.pop()?;
    let stem = file.strip_suffix(".py")?;
    if stem != "__init__" {
        parts.push(stem.to_string());
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("."))
}
