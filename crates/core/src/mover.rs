//! File relocation with duplicate resolution.
//!
//! A destination file's bytes are never overwritten in place: replacement is
//! always delete-then-move or a no-op, so an interrupted run cannot leave a
//! half-written file at a canonical path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

/// Errors from a single move operation.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to move {source_path} to {destination}: {source}")]
    MoveFailed {
        source_path: PathBuf,
        destination: PathBuf,
        source: io::Error,
    },

    #[error("Failed to delete duplicate {path}: {source}")]
    DuplicateDeletionFailed {
        path: PathBuf,
        source: io::Error,
    },
}

/// What happened to the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The source now lives at the destination (or already did).
    Moved,
    /// The destination was occupied; both files were left in place.
    KeptDuplicate,
    /// The destination was occupied and is authoritative; the source was
    /// deleted, the destination untouched.
    ReplacedDuplicate,
}

/// Move a file to its canonical destination, creating missing parent
/// directories and applying the configured duplicate policy.
pub fn move_file(
    source: &Path,
    destination: &Path,
    config: &Config,
) -> Result<MoveOutcome, MoveError> {
    if source == destination {
        return Ok(MoveOutcome::Moved);
    }

    if !source.exists() {
        return Err(MoveError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }

    if destination.exists() {
        warn!(
            "File already exists: {}. Skipping move for {}.",
            destination.display(),
            source.display()
        );

        if config.settings.delete_duplicates {
            fs::remove_file(source).map_err(|e| MoveError::DuplicateDeletionFailed {
                path: source.to_path_buf(),
                source: e,
            })?;
            return Ok(MoveOutcome::ReplacedDuplicate);
        }
        return Ok(MoveOutcome::KeptDuplicate);
    }

    if let Some(parent) = destination.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| MoveError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    match fs::rename(source, destination) {
        Ok(()) => {
            debug!("Moved {} -> {}", source.display(), destination.display());
            Ok(MoveOutcome::Moved)
        }
        Err(e) if is_cross_device(&e) => copy_then_remove(source, destination),
        Err(e) => Err(MoveError::MoveFailed {
            source_path: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source: e,
        }),
    }
}

// Cross-filesystem renames fail with EXDEV (18 on Linux).
fn is_cross_device(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18)
}

fn copy_then_remove(source: &Path, destination: &Path) -> Result<MoveOutcome, MoveError> {
    let map_err = |e: io::Error| MoveError::MoveFailed {
        source_path: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source: e,
    };

    fs::copy(source, destination).map_err(map_err)?;
    fs::remove_file(source).map_err(map_err)?;
    debug!(
        "Moved {} -> {} (cross-device copy)",
        source.display(),
        destination.display()
    );
    Ok(MoveOutcome::Moved)
}
