use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use stream_api::endpoints;
use stream_api::types::{SearchItem, Thumbnail};
use stream_api::ClientError;

/// Host suffixes of anonymity networks that plain HTTP cannot reach.
const UNREACHABLE_SUFFIXES: &[&str] = &[".onion", ".i2p"];

// ── Mirrors ─────────────────────────────────────────────────────

/// Origin of an API-compatible video instance, e.g. `https://yewtu.be`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Mirror {
    origin: String,
}

impl Mirror {
    /// Parse and normalize an origin. Trailing slashes are stripped.
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        Ok(Self {
            origin: endpoints::normalize_origin(raw)?,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// True for `.onion` / `.i2p` hosts.
    pub fn is_anonymity_network(&self) -> bool {
        endpoints::host_of(&self.origin)
            .is_some_and(|host| UNREACHABLE_SUFFIXES.iter().any(|s| host.ends_with(s)))
    }
}

impl fmt::Display for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.origin)
    }
}

/// The three gates a mirror passes through during discovery, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HealthStage {
    ApiShape,
    VideoDetail,
    StreamReachability,
}

impl fmt::Display for HealthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiShape => write!(f, "api-shape"),
            Self::VideoDetail => write!(f, "video-detail"),
            Self::StreamReachability => write!(f, "stream-reachability"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorStatus {
    Strong,
    Rejected { stage: HealthStage, reason: String },
}

// ── Search hits ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HitKind {
    Video,
    Playlist,
    Channel,
}

/// A search result before stream resolution.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub kind: HitKind,
    pub id: String,
    pub title: String,
    pub author: String,
    /// Videos only.
    pub duration_seconds: Option<u64>,
    /// For playlists, the thumbnails of the first nested video.
    pub thumbnails: Vec<Thumbnail>,
    /// Playlists only.
    pub item_count: Option<u32>,
}

impl SearchHit {
    /// Convert a raw search item. Items of unknown type, and channels
    /// without an id, yield `None`.
    pub fn from_item(item: SearchItem) -> Option<Self> {
        match item {
            SearchItem::Video(v) => Some(Self {
                kind: HitKind::Video,
                id: v.video_id,
                title: v.title,
                author: v.author,
                duration_seconds: Some(v.length_seconds),
                thumbnails: v.video_thumbnails,
                item_count: None,
            }),
            SearchItem::Playlist(p) => Some(Self {
                kind: HitKind::Playlist,
                id: p.playlist_id,
                title: p.title,
                author: p.author,
                duration_seconds: None,
                thumbnails: p
                    .videos
                    .into_iter()
                    .next()
                    .map(|v| v.video_thumbnails)
                    .unwrap_or_default(),
                item_count: Some(p.video_count),
            }),
            SearchItem::Channel(c) => c.author_id.map(|id| Self {
                kind: HitKind::Channel,
                id,
                title: c.author.clone(),
                author: c.author,
                duration_seconds: None,
                thumbnails: Vec::new(),
                item_count: None,
            }),
            SearchItem::Unknown => None,
        }
    }

    /// Poster URL qualified against `origin`: the `medium` thumbnail if
    /// present, else the first one.
    pub fn poster_url(&self, origin: &str) -> Option<String> {
        let thumb = self
            .thumbnails
            .iter()
            .find(|t| t.quality == "medium")
            .or_else(|| self.thumbnails.first())?;
        endpoints::qualify_url(origin, &thumb.url).ok()
    }
}

// ── Emitted records ─────────────────────────────────────────────

/// A resolved, playable video. Only built once its playback URL answered
/// a reachability probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub duration_seconds: u64,
    pub poster_url: Option<String>,
    pub playback_url: String,
    pub audio_download_url: Option<String>,
    pub video_download_url: Option<String>,
    pub mirror: Mirror,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub poster_url: Option<String>,
    pub item_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SearchRecord {
    Video(VideoRecord),
    Playlist(PlaylistRecord),
}

impl SearchRecord {
    pub fn id(&self) -> &str {
        match self {
            Self::Video(v) => &v.id,
            Self::Playlist(p) => &p.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Video(v) => &v.title,
            Self::Playlist(p) => &p.title,
        }
    }
}

// ── Search options ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    Rating,
    UploadDate,
    ViewCount,
}

impl SortBy {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Rating => "rating",
            Self::UploadDate => "upload_date",
            Self::ViewCount => "view_count",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(Self::Relevance),
            "rating" => Ok(Self::Rating),
            "upload_date" => Ok(Self::UploadDate),
            "view_count" => Ok(Self::ViewCount),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub sort_by: SortBy,
}
