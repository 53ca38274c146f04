use serde::{Deserialize, Deserializer, Serialize};

// ── Directory (api.invidious.io/instances.json) ─────────────────

/// One directory row: `[name, {uri, type, api, ...}]`.
#[derive(Debug, Deserialize)]
pub struct DirectoryEntry(pub String, pub DirectoryInstance);

#[derive(Debug, Deserialize)]
pub struct DirectoryInstance {
    pub uri: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub api: Option<bool>,
}

// ── Health probes ───────────────────────────────────────────────

/// Search item as returned with `fields=type`.
#[derive(Debug, Deserialize)]
pub struct ProbeItem {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

// ── Video formats ───────────────────────────────────────────────

/// Body of `/api/v1/videos/{id}` restricted to format fields.
///
/// Mirrors that refuse a video answer with `{"error": "..."}`, sometimes
/// with status 200, so both shapes deserialize here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFormats {
    pub format_streams: Option<Vec<FormatStream>>,
    pub adaptive_formats: Option<Vec<AdaptiveFormat>>,
    pub error: Option<String>,
}

/// A progressive (muxed audio+video) stream.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatStream {
    pub url: String,
    #[serde(rename = "type")]
    pub mime: String,
    pub quality_label: Option<String>,
    pub quality: Option<String>,
}

/// A single-track adaptive format.
#[derive(Debug, Clone, Deserialize)]
pub struct AdaptiveFormat {
    pub url: String,
    #[serde(rename = "type")]
    pub mime: String,
    #[serde(default, deserialize_with = "de_bitrate")]
    pub bitrate: u64,
}

/// Mirrors serve `bitrate` as either a number or a numeric string.
fn de_bitrate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n,
        Raw::Str(s) => s.trim().parse().unwrap_or(0),
        Raw::Null => 0,
    })
}

// ── Search ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub quality: String,
    pub url: String,
}

/// One item of a `type=all` search page.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchItem {
    Video(VideoItem),
    Playlist(PlaylistItem),
    Channel(ChannelItem),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub length_seconds: u64,
    #[serde(default)]
    pub video_thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub playlist_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub video_count: u32,
    #[serde(default)]
    pub videos: Vec<PlaylistVideo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideo {
    #[serde(default)]
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub length_seconds: u64,
    #[serde(default)]
    pub video_thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelItem {
    #[serde(default)]
    pub author: String,
    pub author_id: Option<String>,
}
