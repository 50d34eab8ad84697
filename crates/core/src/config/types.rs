use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration. Every section has complete defaults: an absent
/// config file resolves to a fully usable `Config`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub qbittorrent: Option<QBittorrentConfig>,
    #[serde(default)]
    pub subtitles: SubtitlesConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Naming and duplicate policy knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SettingsConfig {
    /// When a move target already exists, delete the source instead of
    /// keeping both files.
    #[serde(default)]
    pub delete_duplicates: bool,
    /// Include the detected quality token in canonical names.
    #[serde(default = "default_true")]
    pub include_quality: bool,
    /// Title-case show and movie names.
    #[serde(default = "default_true")]
    pub capitalize: bool,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            delete_duplicates: false,
            include_quality: true,
            capitalize: true,
        }
    }
}

/// File and folder vocabulary: what to keep, what to delete, what never to
/// touch. All lists are data, not logic, so new release-naming conventions
/// are a config edit.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    /// Extensions (lowercase, no dot) recognized as video content.
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
    /// Extra extensions kept by cleanup beyond the video set, e.g. the
    /// in-progress download marker.
    #[serde(default = "default_keep_extensions")]
    pub keep_extensions: Vec<String>,
    /// Directory names deleted outright during cleanup.
    #[serde(default = "default_unwanted_folders")]
    pub unwanted_folders: Vec<String>,
    /// Path segments marking media-server-managed content. Anything under
    /// such a segment is never deleted, renamed, or moved.
    #[serde(default = "default_plex_markers")]
    pub plex_markers: Vec<String>,
    /// Closed quality vocabulary, checked in order; the first token found in
    /// a filename wins and is rendered with the casing given here.
    #[serde(default = "default_quality_tokens")]
    pub quality_tokens: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            video_extensions: default_video_extensions(),
            keep_extensions: default_keep_extensions(),
            unwanted_folders: default_unwanted_folders(),
            plex_markers: default_plex_markers(),
            quality_tokens: default_quality_tokens(),
        }
    }
}

impl MediaConfig {
    /// Returns true when the file name carries a video extension.
    pub fn is_video_name(&self, name: &str) -> bool {
        match extension_of(name) {
            Some(ext) => self
                .video_extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    /// Returns true when the file name's extension is in the kept set
    /// (video extensions plus the extra keep list).
    pub fn is_kept_extension(&self, name: &str) -> bool {
        match extension_of(name) {
            Some(ext) => {
                self.video_extensions
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(ext))
                    || self
                        .keep_extensions
                        .iter()
                        .any(|e| e.eq_ignore_ascii_case(ext))
            }
            None => false,
        }
    }

    /// Returns true when the directory name is on the deletion denylist.
    pub fn is_unwanted_folder(&self, name: &str) -> bool {
        self.unwanted_folders.iter().any(|f| f.eq_ignore_ascii_case(name))
    }

    /// Returns true when the path component is a Plex-managed marker.
    pub fn is_plex_component(&self, name: &str) -> bool {
        self.plex_markers.iter().any(|m| m == name)
    }

    /// Returns true when the path is a video file by extension.
    pub fn is_video_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| self.is_video_name(n))
            .unwrap_or(false)
    }
}

fn extension_of(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext)
}

/// qBittorrent Web API endpoint for the torrent-removal collaborator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI URL, e.g. "http://localhost:8081".
    #[serde(default = "default_qb_url")]
    pub url: String,
    pub username: String,
    pub password: String,
    /// Request timeout in seconds.
    #[serde(default = "default_qb_timeout")]
    pub timeout_secs: u32,
}

/// Subtitle embedding collaborator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubtitlesConfig {
    #[serde(default = "default_true")]
    pub enable_embedding: bool,
    /// Extensions (lowercase, no dot) recognized as loose subtitle files.
    #[serde(default = "default_subtitle_extensions")]
    pub subtitle_extensions: Vec<String>,
}

impl Default for SubtitlesConfig {
    fn default() -> Self {
        Self {
            enable_embedding: true,
            subtitle_extensions: default_subtitle_extensions(),
        }
    }
}

/// Audio stream inspection collaborator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enable_scan: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { enable_scan: true }
    }
}

fn default_true() -> bool {
    true
}

fn default_video_extensions() -> Vec<String> {
    vec!["mkv".to_string(), "mp4".to_string()]
}

fn default_keep_extensions() -> Vec<String> {
    vec!["!qb".to_string()]
}

fn default_unwanted_folders() -> Vec<String> {
    [
        "Plex Versions",
        "Extras",
        "Sample",
        "Samples",
        "Subs",
        "Subtitles",
        "Proof",
        "Screenshots",
        "Artwork",
        "Cover",
        "Covers",
        "Poster",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_plex_markers() -> Vec<String> {
    vec!["Plex Versions".to_string()]
}

fn default_quality_tokens() -> Vec<String> {
    [
        "2160p", "1080p", "720p", "480p", "BluRay", "BDRip", "BRRip", "WEB-DL", "WEBRip", "HDTV",
        "DVDRip",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_subtitle_extensions() -> Vec<String> {
    vec!["srt".to_string(), "ass".to_string(), "sub".to_string()]
}

fn default_qb_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_qb_timeout() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_complete() {
        let config = Config::default();
        assert!(!config.settings.delete_duplicates);
        assert!(config.settings.include_quality);
        assert!(config.settings.capitalize);
        assert!(config.media.is_video_name("episode.mkv"));
        assert!(config.media.is_video_name("movie.MP4"));
        assert!(config.qbittorrent.is_none());
    }

    #[test]
    fn test_kept_extensions_include_download_marker() {
        let media = MediaConfig::default();
        assert!(media.is_kept_extension("episode.mkv"));
        assert!(media.is_kept_extension("episode.mkv.!qB"));
        assert!(!media.is_kept_extension("notes.txt"));
        assert!(!media.is_kept_extension("no_extension"));
    }

    #[test]
    fn test_unwanted_folder_match_is_case_insensitive() {
        let media = MediaConfig::default();
        assert!(media.is_unwanted_folder("Subs"));
        assert!(media.is_unwanted_folder("subs"));
        assert!(!media.is_unwanted_folder("Season 01"));
    }

    #[test]
    fn test_plex_component_match_is_exact() {
        let media = MediaConfig::default();
        assert!(media.is_plex_component("Plex Versions"));
        assert!(!media.is_plex_component("plex versions"));
    }
}
