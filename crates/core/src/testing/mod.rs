//! Testing utilities and mock collaborator implementations.
//!
//! Recording mocks for the orchestrator's hook seams, so runs can be tested
//! without a torrent client or media tools installed. The mocks are cheap
//! clones sharing one recording, so a test can keep a handle after boxing a
//! clone into the organizer.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::hooks::{CleanupHook, HookError, PostMoveHook, TorrentRemover};
use crate::media::MediaItem;

/// Records removal requests instead of talking to a torrent client.
#[derive(Debug, Clone, Default)]
pub struct RecordingTorrentRemover {
    removed: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingTorrentRemover {
    pub fn new() -> Self {
        Self::default()
    }

    /// A remover whose every attempt fails.
    pub fn failing() -> Self {
        Self {
            removed: Arc::default(),
            fail: true,
        }
    }

    pub fn removed_hashes(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

impl TorrentRemover for RecordingTorrentRemover {
    fn name(&self) -> &str {
        "recording"
    }

    fn remove(&self, hash: &str) -> Result<(), HookError> {
        self.removed.lock().unwrap().push(hash.to_string());
        if self.fail {
            return Err(HookError::ApiError("mock failure".to_string()));
        }
        Ok(())
    }
}

/// Records every post-move invocation.
#[derive(Debug, Clone, Default)]
pub struct RecordingPostMoveHook {
    seen: Arc<Mutex<Vec<PathBuf>>>,
    fail: bool,
}

impl RecordingPostMoveHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hook whose every attempt fails.
    pub fn failing() -> Self {
        Self {
            seen: Arc::default(),
            fail: true,
        }
    }

    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

impl PostMoveHook for RecordingPostMoveHook {
    fn name(&self) -> &str {
        "recording"
    }

    fn run(&self, _item: &MediaItem, final_path: &Path) -> Result<(), HookError> {
        self.seen.lock().unwrap().push(final_path.to_path_buf());
        if self.fail {
            return Err(HookError::ApiError("mock failure".to_string()));
        }
        Ok(())
    }
}

/// Records every cleanup-phase invocation.
#[derive(Debug, Clone, Default)]
pub struct RecordingCleanupHook {
    roots: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingCleanupHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen_roots(&self) -> Vec<PathBuf> {
        self.roots.lock().unwrap().clone()
    }
}

impl CleanupHook for RecordingCleanupHook {
    fn name(&self) -> &str {
        "recording"
    }

    fn run(&self, root: &Path) -> Result<(), HookError> {
        self.roots.lock().unwrap().push(root.to_path_buf());
        Ok(())
    }
}
