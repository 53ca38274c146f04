//! Stream selection policy for playback and downloads.

use stream_api::types::{AdaptiveFormat, FormatStream, VideoFormats};

use crate::config::SearchConfig;

const MP4_VIDEO: &str = "video/mp4";
const MP4_AUDIO: &str = "audio/mp4";

/// Download candidates for a video. Either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadUrls {
    pub audio: Option<String>,
    pub video: Option<String>,
}

/// Which formats to play and offer for download.
///
/// Playback uses a single progressive stream at a fixed quality label; there
/// is no adaptive-bitrate selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPolicy {
    pub playback_quality: String,
    pub download_quality: String,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            playback_quality: "360p".into(),
            download_quality: "720p".into(),
        }
    }
}

impl FormatPolicy {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            playback_quality: config.playback_quality.clone(),
            download_quality: config.download_quality.clone(),
        }
    }

    /// The progressive stream whose quality label matches exactly.
    pub fn playback<'a>(&self, streams: &'a [FormatStream]) -> Option<&'a FormatStream> {
        streams
            .iter()
            .find(|s| s.quality_label.as_deref() == Some(self.playback_quality.as_str()))
    }

    pub fn downloads(&self, formats: &VideoFormats) -> DownloadUrls {
        let audio = formats
            .adaptive_formats
            .as_deref()
            .and_then(best_audio)
            .map(|f| f.url.clone());
        let video = formats
            .format_streams
            .as_deref()
            .and_then(|s| best_video(s, &self.download_quality))
            .map(|f| f.url.clone());
        DownloadUrls { audio, video }
    }
}

/// Highest-bitrate MP4 audio track.
pub fn best_audio(adaptive: &[AdaptiveFormat]) -> Option<&AdaptiveFormat> {
    adaptive
        .iter()
        .filter(|f| f.mime.starts_with(MP4_AUDIO))
        .max_by_key(|f| f.bitrate)
}

/// MP4 progressive stream at `target` quality, else the first MP4 stream.
pub fn best_video<'a>(streams: &'a [FormatStream], target: &str) -> Option<&'a FormatStream> {
    let mut mp4 = streams.iter().filter(|s| s.mime.starts_with(MP4_VIDEO));
    let first = mp4.next()?;
    if first.quality_label.as_deref() == Some(target) {
        return Some(first);
    }
    mp4.find(|s| s.quality_label.as_deref() == Some(target))
        .or(Some(first))
}

/// First progressive stream in a widely playable container.
pub fn first_playable(streams: &[FormatStream]) -> Option<&FormatStream> {
    streams.iter().find(|s| s.mime.starts_with(MP4_VIDEO))
}
