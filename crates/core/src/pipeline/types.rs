use std::fmt;
use std::path::PathBuf;

/// What a run did, and what it left alone and why. A run with skips is
/// still a successful run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Files relocated to their canonical path.
    pub moved: u64,
    /// Occupied destinations where both files were kept.
    pub duplicates_kept: u64,
    /// Occupied destinations where the source was discarded.
    pub duplicates_replaced: u64,
    /// Candidates skipped because the index already knew them.
    pub already_indexed: u64,
    /// Index entries written this run.
    pub indexed_added: u64,
    /// Files removed by cleanup.
    pub files_deleted: u64,
    /// Directories removed by cleanup.
    pub dirs_deleted: u64,
    /// Files left untouched, with reasons.
    pub skips: Vec<Skip>,
}

impl RunSummary {
    pub fn skipped(&self) -> usize {
        self.skips.len()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "moved: {}, duplicates kept: {}, duplicates replaced: {}, \
             already indexed: {}, newly indexed: {}, \
             files deleted: {}, dirs deleted: {}, skipped: {}",
            self.moved,
            self.duplicates_kept,
            self.duplicates_replaced,
            self.already_indexed,
            self.indexed_added,
            self.files_deleted,
            self.dirs_deleted,
            self.skipped()
        )
    }
}

/// A file the run left untouched.
#[derive(Debug, Clone)]
pub struct Skip {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub enum SkipReason {
    /// The filename does not fit the grammar; no rename was attempted.
    ParseNoMatch,
    /// A per-file I/O failure.
    Filesystem(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ParseNoMatch => write!(f, "filename does not fit the naming grammar"),
            SkipReason::Filesystem(e) => write!(f, "filesystem error: {}", e),
        }
    }
}
