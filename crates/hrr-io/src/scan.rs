//! Image discovery in an analysis directory.

use std::io;
use std::path::{Path, PathBuf};

/// List the files directly inside `dir` whose extension matches one of
/// `extensions` (case-insensitive, no leading dot), sorted by path.
///
/// Sub-directories are not descended into.
///
/// # Errors
///
/// Returns any I/O error from reading the directory or its entries.
pub fn scan_images(dir: &Path, extensions: &[String]) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if has_extension(&path, extensions) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
