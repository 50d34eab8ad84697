//! Tree cleanup: unwanted files, denylisted folders, leftover empties.
//!
//! Deletions are irreversible and intentionally aggressive — there is no
//! trash. The one absolute exclusion is Plex-managed content: anything under
//! a configured marker segment is skipped before any other rule applies.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use walkdir::{DirEntry, WalkDir};

use crate::classifier::is_plex_path;
use crate::config::Config;
use crate::index::INDEX_FILENAME;

/// Counts of what a cleanup pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub files_deleted: u64,
    pub dirs_deleted: u64,
}

impl CleanupStats {
    pub fn merge(&mut self, other: CleanupStats) {
        self.files_deleted += other.files_deleted;
        self.dirs_deleted += other.dirs_deleted;
    }
}

fn descend(entry: &DirEntry, config: &Config) -> bool {
    if !entry.file_type().is_dir() {
        return true;
    }
    // Plex-managed subtrees are not listed at all: no deletion, no descent.
    entry
        .file_name()
        .to_str()
        .map(|n| !config.media.is_plex_component(n))
        .unwrap_or(true)
}

/// Clean a directory tree. Per-entry failures are logged and skipped; the
/// pass always runs to completion.
pub fn clean(dir: &Path, config: &Config) -> CleanupStats {
    let mut stats = CleanupStats::default();

    if !dir.is_dir() || is_plex_path(dir, &config.media) {
        return stats;
    }

    let mut unwanted_dirs: Vec<PathBuf> = Vec::new();
    let mut files: Vec<PathBuf> = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| descend(e, config));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("Walk error under {}: {}", dir.display(), e);
                continue;
            }
        };
        if entry.file_type().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                if config.media.is_unwanted_folder(name) {
                    unwanted_dirs.push(entry.into_path());
                }
            }
        } else if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    for unwanted in &unwanted_dirs {
        if !unwanted.exists() {
            continue;
        }
        match fs::remove_dir_all(unwanted) {
            Ok(()) => {
                debug!("Deleted unwanted folder {}", unwanted.display());
                stats.dirs_deleted += 1;
            }
            Err(e) => error!("Failed to delete folder {}: {}", unwanted.display(), e),
        }
    }

    for file in &files {
        if !file.exists() {
            // Parent was removed as an unwanted folder.
            continue;
        }
        if !should_delete_file(file, config) {
            continue;
        }
        match fs::remove_file(file) {
            Ok(()) => {
                debug!("Deleted file {}", file.display());
                stats.files_deleted += 1;
            }
            Err(e) => error!("Failed to delete file {}: {}", file.display(), e),
        }
    }

    stats.dirs_deleted += remove_empty_dirs(dir, config);
    stats
}

fn should_delete_file(file: &Path, config: &Config) -> bool {
    let name = match file.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        // Non-UTF-8 names cannot match the allow-list.
        None => return true,
    };
    if name == INDEX_FILENAME || config.media.is_plex_component(name) {
        return false;
    }
    if name.to_lowercase().contains("sample") {
        return true;
    }
    !config.media.is_kept_extension(name)
}

/// Remove empty subdirectories bottom-up; emptiness cascades because
/// children are visited before their parent.
fn remove_empty_dirs(dir: &Path, config: &Config) -> u64 {
    let mut removed = 0;

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_entry(|e| descend(e, config));
    for entry in walker.flatten() {
        if !entry.file_type().is_dir() {
            continue;
        }
        let is_empty = fs::read_dir(entry.path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            continue;
        }
        match fs::remove_dir(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => error!("Failed to remove directory {}: {}", entry.path().display(), e),
        }
    }
    removed
}
