use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::INDEX_FILENAME;
use crate::classifier::{is_tv_path, movies_root, tv_show_root};
use crate::config::Config;
use crate::namer::{is_canonical_movie_stem, parse_canonical_episode_stem, parse_season_dir, sanitize};
use crate::parser::normalize_title;

/// Errors from index writes. Reads never fail: a missing or corrupt index
/// is an empty index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Failed to write index at {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: io::Error,
    },

    #[error("{path} is outside index root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// A single indexed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub processed_at: DateTime<Utc>,
}

/// On-disk shape: `{"files": {"<relative path>": {...}}}`. A BTreeMap keeps
/// written keys sorted so the file diffs cleanly between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct IndexFile {
    #[serde(default)]
    files: BTreeMap<String, IndexEntry>,
}

/// Per-run index access with an in-memory cache per root. Not designed for
/// concurrent writers; one run per root at a time.
#[derive(Debug, Default)]
pub struct IndexStore {
    cache: HashMap<PathBuf, IndexFile>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `file_path` is recorded under `root`.
    pub fn is_indexed(&mut self, root: &Path, file_path: &Path) -> bool {
        let Some(key) = rel_key(root, file_path) else {
            return false;
        };
        self.loaded(root).files.contains_key(&key)
    }

    /// Record `file_path` under `root` and persist the index.
    ///
    /// Only call this for files already at their canonical location; the
    /// pipeline guards with [`should_index`] first.
    pub fn record(&mut self, root: &Path, file_path: &Path) -> Result<(), IndexError> {
        let key = rel_key(root, file_path).ok_or_else(|| IndexError::OutsideRoot {
            path: file_path.to_path_buf(),
            root: root.to_path_buf(),
        })?;

        let index = self.loaded_mut(root);
        index.files.insert(
            key,
            IndexEntry {
                processed_at: Utc::now(),
            },
        );
        let snapshot = index.clone();
        write_index(root, &snapshot)
    }

    /// Number of entries currently known for `root`.
    pub fn len(&mut self, root: &Path) -> usize {
        self.loaded(root).files.len()
    }

    pub fn is_empty(&mut self, root: &Path) -> bool {
        self.len(root) == 0
    }

    fn loaded(&mut self, root: &Path) -> &IndexFile {
        self.loaded_mut(root)
    }

    fn loaded_mut(&mut self, root: &Path) -> &mut IndexFile {
        self.cache
            .entry(root.to_path_buf())
            .or_insert_with(|| read_index(root))
    }
}

/// Index keys are `/`-joined paths relative to the index root, so index
/// files are portable across platforms.
fn rel_key(root: &Path, file_path: &Path) -> Option<String> {
    let rel = file_path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

fn read_index(root: &Path) -> IndexFile {
    let path = root.join(INDEX_FILENAME);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No index file at {}", path.display());
            return IndexFile::default();
        }
        Err(e) => {
            warn!("Error reading index {}: {}, treating as empty", path.display(), e);
            return IndexFile::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(index) => index,
        Err(e) => {
            warn!(
                "Corrupt index {}: {}, treating as empty",
                path.display(),
                e
            );
            IndexFile::default()
        }
    }
}

/// Write the whole index: sibling temp file, then rename into place.
fn write_index(root: &Path, index: &IndexFile) -> Result<(), IndexError> {
    let path = root.join(INDEX_FILENAME);
    let tmp = root.join(format!("{}.tmp", INDEX_FILENAME));
    let map_err = |source: io::Error| IndexError::WriteFailed {
        path: path.clone(),
        source,
    };

    if !root.exists() {
        fs::create_dir_all(root).map_err(map_err)?;
    }

    let payload = serde_json::to_string_pretty(index)
        .map_err(|e| map_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    fs::write(&tmp, payload).map_err(map_err)?;
    fs::rename(&tmp, &path).map_err(map_err)?;
    Ok(())
}

/// The index root responsible for a file: the show root for anything under
/// `tv/`, otherwise the movies root, otherwise `fallback` (single-item
/// runs with no library context).
pub fn index_root_for(file_path: &Path, fallback: &Path) -> PathBuf {
    let parent = file_path.parent().unwrap_or(fallback);
    if is_tv_path(parent) {
        tv_show_root(parent).unwrap_or_else(|| fallback.to_path_buf())
    } else {
        movies_root(parent).unwrap_or_else(|| fallback.to_path_buf())
    }
}

/// True only when a file is already in the organizer's final layout.
///
/// This is the §3 invariant guard: raw or half-organized names must never be
/// indexed, or future runs would skip files that still need work.
///
/// TV: the index root is the show root; the file sits directly under a
/// canonical `Season NN/` folder, its name starts with the show title, and
/// the season in the name matches the folder. Movies: directly under the
/// movies root with a canonical `Title (Year)` name.
pub fn should_index(root: &Path, file_path: &Path, config: &Config) -> bool {
    if !config.media.is_video_path(file_path) {
        return false;
    }
    let Some(name) = file_path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name);
    let Some(parent) = file_path.parent() else {
        return false;
    };

    if is_tv_path(root) {
        if tv_show_root(root).as_deref() != Some(root) {
            return false;
        }
        if parent.parent() != Some(root) {
            return false;
        }
        let Some(season_folder) = parent
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_season_dir)
        else {
            return false;
        };
        let Some((show_in_name, season_in_name)) = parse_canonical_episode_stem(stem) else {
            return false;
        };
        if season_in_name != season_folder {
            return false;
        }
        let Some(show_dir) = root.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        show_in_name == sanitize(&normalize_title(show_dir, config))
    } else {
        parent == root && is_canonical_movie_stem(stem)
    }
}
