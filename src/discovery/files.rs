//! Source file discovery with parallel traversal.
//!
//! This module implements file discovery that:
//! - Enumerates every regular file under the root with a configured
//!   Python extension
//! - Optionally respects .gitignore via the `ignore` crate
//! - Applies flowscan.toml/pyproject.toml include/exclude patterns
//! - Returns deterministic (sorted) results
//!
//! Sorting matters beyond cosmetics: the scanner merges per-file results
//! in this order, so it decides which record survives an id collision.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ignore::{WalkBuilder, WalkState};

use crate::config::Config;
use crate::error::ScanError;

/// Find Python source files below `root` according to `config`.
///
/// ## Errors
/// [`ScanError::RootNotFound`] if `root` does not exist or is not a
/// directory, [`ScanError::RootUnreadable`] if it cannot be listed.
/// Unreadable entries below the root are logged and skipped.
///
/// ## Returns
/// Lexicographically sorted paths, each prefixed by `root` as given.
pub fn find_source_files(root: &Path, config: &Config) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound {
            path: root.to_path_buf(),
        });
    }
    // The walker reports an unlistable root as an ordinary entry error
    if let Err(source) = std::fs::read_dir(root) {
        return Err(ScanError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        });
    }

    let gitignore = config.respect_gitignore;
    let walker = WalkBuilder::new(root)
        .hidden(false)              // Hidden directories are scanned like any other
        .ignore(gitignore)          // .ignore files
        .parents(gitignore)         // Ignore files in parent directories
        .git_ignore(gitignore)
        .git_global(gitignore)
        .git_exclude(gitignore)
        .require_git(false)         // Work even in non-git directories
        .follow_links(false)        // Don't follow symlinked directories (avoid cycles)
        .threads(0)                 // Auto-detect thread count for parallelism
        .build_parallel();

    let files = Mutex::new(Vec::new());

    walker.run(|| {
        Box::new(|entry_result| {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    return WalkState::Continue;
                }
            };
            let path = entry.path();

            if !path.is_file() || !config.is_source_file(path) {
                return WalkState::Continue;
            }

            // Patterns match against the root-relative path
            let rel_path = path.strip_prefix(root).unwrap_or(path);
            if !config.should_include(rel_path) {
                tracing::trace!(path = %path.display(), "excluded by config");
                return WalkState::Continue;
            }

            if let Ok(mut files) = files.lock() {
                files.push(path.to_path_buf());
            }
            WalkState::Continue
        })
    });

    let mut files = files.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    files.sort();
    Ok(files)
}
