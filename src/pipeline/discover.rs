//! Input discovery: list the photos in a directory in a stable order.
//!
//! Sorting by file name is what makes the generated document reproducible:
//! `read_dir` order is filesystem-dependent. Hidden files are skipped the
//! same way a shell `*.jpg` glob skips them, which also keeps macOS `._*`
//! resource-fork files out of the batch.

use crate::error::Notes2TexError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A discovered image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub path: PathBuf,
    /// File name only; doubles as the sort key and the section title.
    pub file_name: String,
    /// 0-based position in the sorted batch.
    pub index: usize,
}

/// List regular files in `dir` whose extension is in `extensions`
/// (compared case-insensitively), sorted by file name.
///
/// Returns an empty list for a directory without matching files.
pub fn discover(dir: &Path, extensions: &[String]) -> Result<Vec<ImageRef>, Notes2TexError> {
    let metadata = std::fs::metadata(dir).map_err(|e| stat_error(dir, e))?;
    if !metadata.is_dir() {
        return Err(Notes2TexError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let unreadable = |source| Notes2TexError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut found: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let path = entry.path();

        let file_name = entry.file_name().to_string_lossy().into_owned();
        if file_name.starts_with('.') {
            continue;
        }
        // `is_file` follows symlinks, so linked photos are included.
        if !path.is_file() {
            continue;
        }
        if !has_accepted_extension(&path, extensions) {
            debug!("Skipping non-image file: {}", path.display());
            continue;
        }
        found.push((file_name, path));
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    debug!("Discovered {} images in {}", found.len(), dir.display());

    Ok(found
        .into_iter()
        .enumerate()
        .map(|(index, (file_name, path))| ImageRef {
            path,
            file_name,
            index,
        })
        .collect())
}

/// Only a path that does not exist is "not found"; anything else that stops
/// `stat` (e.g. a permission-denied parent) means it could not be read.
fn stat_error(dir: &Path, source: std::io::Error) -> Notes2TexError {
    match source.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => Notes2TexError::DirectoryNotFound {
            path: dir.to_path_buf(),
        },
        _ => Notes2TexError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source,
        },
    }
}

fn has_accepted_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|accepted| accepted.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}
