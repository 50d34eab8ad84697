use std::path::Path;
use tracing::{debug, warn};

use super::{probe_streams, StreamInfo};
use crate::hooks::{HookError, PostMoveHook};
use crate::media::MediaItem;

/// Reports audio tracks that carry no language tag.
///
/// Actual language detection is out of scope for the organizer: this scanner
/// only probes container metadata so missing tags are visible in the log and
/// can be fixed by an external tool.
#[derive(Debug, Default)]
pub struct AudioLanguageScanner;

impl AudioLanguageScanner {
    pub fn new() -> Self {
        Self
    }
}

fn untagged_audio_indices(streams: &[StreamInfo]) -> Vec<u32> {
    streams
        .iter()
        .filter(|s| s.codec_type == "audio")
        .filter(|s| {
            !matches!(
                s.tags.language.as_deref(),
                Some(lang) if !lang.is_empty() && lang != "und"
            )
        })
        .map(|s| s.index)
        .collect()
}

impl PostMoveHook for AudioLanguageScanner {
    fn name(&self) -> &str {
        "audio-language-scan"
    }

    fn run(&self, _item: &MediaItem, final_path: &Path) -> Result<(), HookError> {
        let streams = probe_streams(final_path)?;
        let untagged = untagged_audio_indices(&streams);

        if untagged.is_empty() {
            debug!("All audio tracks tagged in {}", final_path.display());
        } else {
            warn!(
                "{}: audio tracks without language tag: {:?}",
                final_path.display(),
                untagged
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mediatools::StreamTags;

    fn stream(index: u32, codec_type: &str, language: Option<&str>) -> StreamInfo {
        StreamInfo {
            index,
            codec_type: codec_type.to_string(),
            tags: StreamTags {
                language: language.map(|l| l.to_string()),
            },
        }
    }

    #[test]
    fn test_untagged_detection() {
        let streams = vec![
            stream(0, "video", None),
            stream(1, "audio", Some("eng")),
            stream(2, "audio", None),
            stream(3, "audio", Some("und")),
            stream(4, "audio", Some("")),
            stream(5, "subtitle", None),
        ];
        assert_eq!(untagged_audio_indices(&streams), vec![2, 3, 4]);
    }

    #[test]
    fn test_fully_tagged_file_reports_nothing() {
        let streams = vec![stream(0, "video", None), stream(1, "audio", Some("ita"))];
        assert!(untagged_audio_indices(&streams).is_empty());
    }
}
