//! Collaborator capability seams.
//!
//! The orchestrator invokes these at fixed points in a run and never depends
//! on their success: a hook failure is logged and the run continues.

use std::path::Path;
use thiserror::Error;

use crate::media::MediaItem;

/// Errors surfaced by collaborator implementations.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to run {command}: {source}")]
    CommandUnavailable {
        command: String,
        source: std::io::Error,
    },

    #[error("Unexpected tool output: {0}")]
    MalformedOutput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Removes a finished download from the torrent client once the run is
/// complete.
pub trait TorrentRemover {
    fn name(&self) -> &str;

    /// Remove the torrent identified by `hash`, keeping its files on disk.
    fn remove(&self, hash: &str) -> Result<(), HookError>;
}

/// Runs against each file after its move, strictly before final cleanup.
pub trait PostMoveHook {
    fn name(&self) -> &str;

    fn run(&self, item: &MediaItem, final_path: &Path) -> Result<(), HookError>;
}

/// Runs once per section root when its cleanup phase begins, before anything
/// under the root is deleted.
pub trait CleanupHook {
    fn name(&self) -> &str;

    fn run(&self, root: &Path) -> Result<(), HookError>;
}
