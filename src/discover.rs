// src/discover.rs

//! Discovery of terraform directories.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use walkdir::WalkDir;

use crate::errors::Result;

/// Collect every directory under `root` that contains at least one `.tf`
/// file.
///
/// `.terraform` trees (provider and module caches) are skipped entirely.
/// The result is sorted, so job order — and therefore admission order — is
/// stable across runs.
pub fn find_terraform_directories(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = BTreeSet::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == ".terraform"));

    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "tf")
        {
            if let Some(parent) = entry.path().parent() {
                dirs.insert(parent.to_path_buf());
            }
        }
    }

    Ok(dirs.into_iter().collect())
}
