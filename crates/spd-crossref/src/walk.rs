//! Filesystem traversal for source files
//!
//! Recursively collects files whose extension has an entry in the comment
//! syntax table, skipping build output and VCS directories.

use crate::error::ScanError;
use crate::traceability::CommentSyntax;
use std::fs;
use std::path::{Path, PathBuf};

/// Recursively collect scannable file paths under `path`, sorted per directory
///
/// # Errors
/// Returns [`ScanError::ReadDir`] when a directory cannot be listed.
pub fn collect_source_paths(
    path: &Path,
    syntax: &CommentSyntax,
    out: &mut Vec<PathBuf>,
) -> Result<(), ScanError> {
    if path.is_file() {
        if syntax.prefixes_for(path).is_some() {
            out.push(path.to_path_buf());
        }
        return Ok(());
    }
    if !path.is_dir() {
        return Ok(());
    }

    let read_dir = |e| ScanError::ReadDir {
        path: path.to_path_buf(),
        source: e,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(path).map_err(read_dir)? {
        entries.push(entry.map_err(read_dir)?.path());
    }
    entries.sort();

    for entry in entries {
        if entry.is_dir() {
            let skip = entry
                .file_name()
                .and_then(|s| s.to_str())
                .is_some_and(should_skip_dir);
            if !skip {
                collect_source_paths(&entry, syntax, out)?;
            }
        } else if syntax.prefixes_for(&entry).is_some() {
            out.push(entry);
        }
    }
    Ok(())
}

fn should_skip_dir(name: &str) -> bool {
    matches!(
        name,
        ".git" | "target" | "node_modules" | ".venv" | "venv" | "__pycache__"
    )
}
