use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::config::SubtitlesConfig;
use crate::hooks::{HookError, PostMoveHook};
use crate::media::MediaItem;

/// Muxes loose subtitle files sitting next to a video into its container.
///
/// Output goes to a temp sibling first; the original is only replaced after
/// ffmpeg succeeds, and the consumed subtitle files are removed afterwards.
#[derive(Debug)]
pub struct SubtitleEmbedder {
    extensions: Vec<String>,
}

impl SubtitleEmbedder {
    pub fn new(config: &SubtitlesConfig) -> Self {
        Self {
            extensions: config.subtitle_extensions.clone(),
        }
    }

    /// Subtitle files in the same directory as the video, sorted for a
    /// stable track order.
    fn sibling_subtitles(&self, video: &Path) -> Result<Vec<PathBuf>, HookError> {
        let Some(dir) = video.parent() else {
            return Ok(Vec::new());
        };

        let mut subs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let has_sub_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| self.extensions.iter().any(|s| s.eq_ignore_ascii_case(e)))
                .unwrap_or(false);
            if has_sub_ext {
                subs.push(path);
            }
        }
        subs.sort();
        Ok(subs)
    }
}

fn subtitle_codec_for(video: &Path) -> &'static str {
    match video.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("mp4") || ext.eq_ignore_ascii_case("m4v") => {
            "mov_text"
        }
        _ => "srt",
    }
}

impl PostMoveHook for SubtitleEmbedder {
    fn name(&self) -> &str {
        "subtitle-embed"
    }

    fn run(&self, _item: &MediaItem, final_path: &Path) -> Result<(), HookError> {
        let subs = self.sibling_subtitles(final_path)?;
        if subs.is_empty() {
            debug!("No loose subtitles next to {}", final_path.display());
            return Ok(());
        }

        let stem = final_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("video");
        let ext = final_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mkv");
        let tmp = final_path.with_file_name(format!("{}.embed.{}", stem, ext));

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-v", "error", "-i"]).arg(final_path);
        for sub in &subs {
            cmd.arg("-i").arg(sub);
        }
        for input in 0..=subs.len() {
            cmd.arg("-map").arg(input.to_string());
        }
        cmd.args(["-c", "copy", "-c:s", subtitle_codec_for(final_path)])
            .arg(&tmp);

        let output = cmd.output().map_err(|e| HookError::CommandUnavailable {
            command: "ffmpeg".to_string(),
            source: e,
        })?;

        if !output.status.success() {
            let _ = fs::remove_file(&tmp);
            return Err(HookError::CommandFailed {
                command: "ffmpeg".to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        fs::rename(&tmp, final_path)?;
        for sub in &subs {
            if let Err(e) = fs::remove_file(sub) {
                debug!("Could not remove embedded subtitle {}: {}", sub.display(), e);
            }
        }
        info!(
            "Embedded {} subtitle file(s) into {}",
            subs.len(),
            final_path.display()
        );
        Ok(())
    }
}
