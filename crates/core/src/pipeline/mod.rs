//! The pipeline orchestrator.
//!
//! Owns the lifecycle of a run: classify, pre-cleanup, per-file
//! parse/rename/move/index, post-cleanup, collaborator notification. All
//! other components are stateless services it calls per item or per
//! directory.

mod runner;
mod types;

pub use runner::Organizer;
pub use types::{RunSummary, Skip, SkipReason};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal precondition failures. Everything else in a run is contained at
/// the item boundary and reported through [`RunSummary`].
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Start path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Start path is not readable: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: io::Error,
    },
}
