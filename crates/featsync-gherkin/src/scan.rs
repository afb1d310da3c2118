//! Feature repository discovery.

use anyhow::{Context, Result};
use featsync_error::FeatsyncError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Feature files under `path`.
///
/// A file is returned as is; a directory is walked recursively for
/// `*.feature` files, sorted by path. A missing path is an error; an empty
/// result is only a warning.
pub fn feature_files(path: &Path) -> Result<Vec<PathBuf>> {
    let path = std::path::absolute(path)
        .with_context(|| format!("resolve feature repository {}", path.display()))?;
    if !path.exists() {
        return Err(FeatsyncError::missing_repository(path.display()).into());
    }

    let mut files = if path.is_dir() {
        let mut found = Vec::new();
        for entry in WalkDir::new(&path).follow_links(true) {
            let entry = entry.with_context(|| format!("walk {}", path.display()))?;
            if entry.file_type().is_file() && is_feature_file(entry.path()) {
                tracing::debug!(file = %entry.path().display(), "feature file found");
                found.push(entry.into_path());
            }
        }
        found
    } else {
        vec![path.clone()]
    };
    files.sort();

    if files.is_empty() {
        tracing::warn!(repository = %path.display(), "no feature files found in the repository");
    }
    Ok(files)
}

fn is_feature_file(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "feature")
}
