//! Media-inspection collaborators built on external tools.
//!
//! These shell out to `ffprobe`/`ffmpeg` and are invoked by the orchestrator
//! between move and final cleanup. Failures (including the tools being
//! absent) are surfaced as hook errors and contained by the caller.

mod audio;
mod subtitles;

pub use audio::AudioLanguageScanner;
pub use subtitles::SubtitleEmbedder;

use serde::Deserialize;
use std::path::Path;
use std::process::Command;

use crate::hooks::HookError;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<StreamInfo>,
}

/// One stream from `ffprobe -show_streams`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StreamInfo {
    pub index: u32,
    pub codec_type: String,
    #[serde(default)]
    pub tags: StreamTags,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct StreamTags {
    pub language: Option<String>,
}

/// Probe a media file's streams without reading the bitstream ourselves.
pub(crate) fn probe_streams(path: &Path) -> Result<Vec<StreamInfo>, HookError> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(path)
        .output()
        .map_err(|e| HookError::CommandUnavailable {
            command: "ffprobe".to_string(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(HookError::CommandFailed {
            command: "ffprobe".to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let probe: ProbeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| HookError::MalformedOutput(e.to_string()))?;
    Ok(probe.streams)
}
