//! The unit of work: a classified media file.

use std::path::PathBuf;

/// A media file with its classified kind.
///
/// Only constructed for paths whose extension is in the kept-extension set;
/// everything else is removed by cleanup before classification runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Where the file currently lives.
    pub path: PathBuf,
    /// Lowercased extension, without the dot.
    pub extension: String,
    pub kind: MediaKind,
}

/// What a media file represents. Consumers match exhaustively, so adding a
/// content kind is a compile-time-checked change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Episode {
        show: String,
        season: u8,
        episode: u8,
        quality: Option<String>,
    },
    Movie {
        title: String,
        year: u16,
        quality: Option<String>,
    },
}

impl MediaKind {
    /// The detected quality token, if any.
    pub fn quality(&self) -> Option<&str> {
        match self {
            MediaKind::Episode { quality, .. } => quality.as_deref(),
            MediaKind::Movie { quality, .. } => quality.as_deref(),
        }
    }
}
