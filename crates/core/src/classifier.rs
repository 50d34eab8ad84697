//! Start-path classification and shared path predicates.
//!
//! Decides whether a run operates on a library root (a directory holding
//! `tv/` and/or `movies/` subtrees) or on a single downloaded item folder.
//! Also owns the path-shape questions the rest of the pipeline keeps asking:
//! is this under `tv/`, is this Plex-managed, which directory is the show
//! root or the movies root.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::config::MediaConfig;

/// How a start path should be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// The start path holds `tv/` and/or `movies/` subtrees; each existing
    /// subtree is organized in place.
    LibraryRoot {
        tv_dir: Option<PathBuf>,
        movies_dir: Option<PathBuf>,
    },
    /// The start path itself is the unit to organize; `name` is its own
    /// folder name, used when no richer path context exists.
    SingleItem { name: String },
}

/// Classify a start path. Never fails: unrecognized layouts degrade to
/// [`Layout::SingleItem`].
pub fn classify(start: &Path) -> Layout {
    let mut tv_dir = None;
    let mut movies_dir = None;

    match fs::read_dir(start) {
        Ok(entries) => {
            for entry in entries.flatten() {
                if !entry.path().is_dir() {
                    continue;
                }
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if name.eq_ignore_ascii_case("tv") {
                    tv_dir = Some(entry.path());
                } else if name.eq_ignore_ascii_case("movies") {
                    movies_dir = Some(entry.path());
                }
            }
        }
        Err(e) => {
            debug!("Could not list {}: {}", start.display(), e);
        }
    }

    if tv_dir.is_some() || movies_dir.is_some() {
        Layout::LibraryRoot { tv_dir, movies_dir }
    } else {
        Layout::SingleItem {
            name: start
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Returns true when the path has a `tv` component (case-insensitive).
pub fn is_tv_path(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .map(|n| n.eq_ignore_ascii_case("tv"))
            .unwrap_or(false),
        _ => false,
    })
}

/// Returns true when any path component is a configured Plex marker.
/// Plex-managed content is never deleted, renamed, or moved.
pub fn is_plex_path(path: &Path, media: &MediaConfig) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .map(|n| media.is_plex_component(n))
            .unwrap_or(false),
        _ => false,
    })
}

/// The show root for a path under a `tv/` tree: the prefix ending at the
/// component immediately after `tv`. Returns `None` when the path has no
/// `tv` component or nothing follows it.
pub fn tv_show_root(path: &Path) -> Option<PathBuf> {
    let mut prefix = PathBuf::new();
    let mut take_next = false;

    for component in path.components() {
        prefix.push(component);
        if take_next {
            return Some(prefix);
        }
        if let Component::Normal(name) = component {
            if name
                .to_str()
                .map(|n| n.eq_ignore_ascii_case("tv"))
                .unwrap_or(false)
            {
                take_next = true;
            }
        }
    }
    None
}

/// The movies root for a path: the prefix ending at the `movies` component.
pub fn movies_root(path: &Path) -> Option<PathBuf> {
    let mut prefix = PathBuf::new();

    for component in path.components() {
        prefix.push(component);
        if let Component::Normal(name) = component {
            if name
                .to_str()
                .map(|n| n.eq_ignore_ascii_case("movies"))
                .unwrap_or(false)
            {
                return Some(prefix);
            }
        }
    }
    None
}
