//! Index backfill for already-organized libraries.
//!
//! Scans a media root and creates or extends the per-root index files so the
//! organizer can skip content that was placed before indexing existed. Only
//! files already in their final, canonically named location are indexed.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use super::store::{index_root_for, should_index, IndexStore};
use crate::classifier::is_plex_path;
use crate::config::Config;

/// Counts from a backfill scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// Video files seen.
    pub total_videos: u64,
    /// Videos already in canonical place and name.
    pub eligible_videos: u64,
    /// Entries written this scan.
    pub newly_indexed: u64,
}

#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error(
        "Unrecognized library shape: {0} (expected a root containing tv/ or movies/, \
         the tv/ folder, a tv/<show> folder, or the movies/ folder)"
    )]
    UnrecognizedRoot(PathBuf),
}

/// Backfill index files under `start`.
pub fn generate_indexes(start: &Path, config: &Config) -> Result<IndexSummary, BackfillError> {
    if !start.is_dir() {
        return Err(BackfillError::NotADirectory(start.to_path_buf()));
    }

    let directories = directories_to_scan(start)?;
    let mut store = IndexStore::new();
    let mut summary = IndexSummary::default();

    for directory in &directories {
        info!("Backfilling indexes under {}", directory.display());
        scan_directory(directory, config, &mut store, &mut summary);
    }

    Ok(summary)
}

/// Resolve the accepted root shapes: a root holding `tv/` and/or `movies/`,
/// the `tv/` or `movies/` folder itself, or a single `tv/<show>` folder.
fn directories_to_scan(start: &Path) -> Result<Vec<PathBuf>, BackfillError> {
    let tv = start.join("tv");
    let movies = start.join("movies");
    let found: Vec<PathBuf> = [tv, movies].into_iter().filter(|d| d.is_dir()).collect();
    if !found.is_empty() {
        return Ok(found);
    }

    let base = start
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_lowercase());
    if matches!(base.as_deref(), Some("tv") | Some("movies")) {
        return Ok(vec![start.to_path_buf()]);
    }

    let parent_base = start
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(|n| n.to_lowercase());
    if parent_base.as_deref() == Some("tv") {
        return Ok(vec![start.to_path_buf()]);
    }

    Err(BackfillError::UnrecognizedRoot(start.to_path_buf()))
}

fn scan_directory(
    directory: &Path,
    config: &Config,
    store: &mut IndexStore,
    summary: &mut IndexSummary,
) {
    for entry in WalkDir::new(directory).min_depth(1).into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if is_plex_path(path, &config.media) || !config.media.is_video_path(path) {
            continue;
        }

        summary.total_videos += 1;
        let index_root = index_root_for(path, directory);
        if !should_index(&index_root, path, config) {
            continue;
        }

        summary.eligible_videos += 1;
        if store.is_indexed(&index_root, path) {
            debug!("Already indexed: {}", path.display());
            continue;
        }
        match store.record(&index_root, path) {
            Ok(()) => summary.newly_indexed += 1,
            Err(e) => error!("Failed to index {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::INDEX_FILENAME;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_backfills_canonical_files_only() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("movies/Venom (2018) [BluRay].mp4"));
        touch(&temp.path().join("movies/Raw.Release.2019.mkv"));
        touch(&temp.path().join("tv/Black Bird/Season 01/Black Bird S01E01.mkv"));
        touch(&temp.path().join("tv/Black Bird/S01E02.mkv"));

        let summary = generate_indexes(temp.path(), &Config::default()).unwrap();
        assert_eq!(summary.total_videos, 4);
        assert_eq!(summary.eligible_videos, 2);
        assert_eq!(summary.newly_indexed, 2);

        assert!(temp.path().join("movies").join(INDEX_FILENAME).exists());
        assert!(temp
            .path()
            .join("tv/Black Bird")
            .join(INDEX_FILENAME)
            .exists());
    }

    #[test]
    fn test_backfill_is_idempotent() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("movies/Venom (2018).mp4"));

        let first = generate_indexes(temp.path(), &Config::default()).unwrap();
        assert_eq!(first.newly_indexed, 1);
        let second = generate_indexes(temp.path(), &Config::default()).unwrap();
        assert_eq!(second.newly_indexed, 0);
        assert_eq!(second.eligible_videos, 1);
    }

    #[test]
    fn test_accepts_show_folder_directly() {
        let temp = TempDir::new().unwrap();
        let show = temp.path().join("tv/Black Bird");
        touch(&show.join("Season 01/Black Bird S01E01.mkv"));

        let summary = generate_indexes(&show, &Config::default()).unwrap();
        assert_eq!(summary.newly_indexed, 1);
    }

    #[test]
    fn test_rejects_unrecognized_shape() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("random")).unwrap();

        let result = generate_indexes(&temp.path().join("random"), &Config::default());
        assert!(matches!(result, Err(BackfillError::UnrecognizedRoot(_))));
    }

    #[test]
    fn test_rejects_missing_path() {
        let result = generate_indexes(Path::new("/nope"), &Config::default());
        assert!(matches!(result, Err(BackfillError::NotADirectory(_))));
    }
}
