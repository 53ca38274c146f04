//! URL builders for the mirror REST API (`/api/v1/...`) and the directory.

use url::Url;

use crate::error::ClientError;

/// Fields requested from the federated search endpoint. Anything not listed
/// here is stripped by the mirror, which keeps responses small.
pub const SEARCH_FIELDS: &str =
    "type,title,videoId,playlistId,author,lengthSeconds,videoThumbnails,videos,videoCount";

/// Fields requested when resolving a video's streams.
pub const DETAIL_FIELDS: &str = "adaptiveFormats,formatStreams";

/// Directory listing sorted by the directory's own health ranking.
pub fn directory_url(base: &str) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}sort_by=health")
}

/// Stage-one probe: a search restricted to the `type` field.
pub fn probe_search_url(origin: &str, query: &str) -> String {
    format!(
        "{origin}/api/v1/search?q={}&fields=type",
        urlencoding::encode(query)
    )
}

/// Stage-two probe: progressive streams for a known video.
pub fn probe_video_url(origin: &str, video_id: &str) -> String {
    format!(
        "{origin}/api/v1/videos/{}?fields=formatStreams",
        urlencoding::encode(video_id)
    )
}

/// One page of federated search across videos, playlists and channels.
pub fn search_url(origin: &str, query: &str, page: u32, sort_by: Option<&str>) -> String {
    let mut url = format!(
        "{origin}/api/v1/search?q={}&page={page}&type=all&fields={SEARCH_FIELDS}",
        urlencoding::encode(query)
    );
    if let Some(sort) = sort_by {
        url.push_str("&sort_by=");
        url.push_str(&urlencoding::encode(sort));
    }
    url
}

/// Progressive and adaptive formats for one video.
pub fn video_detail_url(origin: &str, video_id: &str) -> String {
    format!(
        "{origin}/api/v1/videos/{}?fields={DETAIL_FIELDS}",
        urlencoding::encode(video_id)
    )
}

/// Canonical form of a mirror origin: `scheme://host[:port]` with no
/// trailing slash. Only http(s) origins with a host are accepted.
pub fn normalize_origin(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidUrl(format!(
            "unsupported scheme in {trimmed}"
        )));
    }
    if url.host_str().is_none() {
        return Err(ClientError::InvalidUrl(format!("missing host in {trimmed}")));
    }
    Ok(trimmed.to_string())
}

/// Host part of an origin, lowercased.
pub fn host_of(origin: &str) -> Option<String> {
    Url::parse(origin)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// Resolve an asset URL as served by a mirror. Mirrors return either
/// absolute URLs, path-only URLs (`/vi/...`) or scheme-relative ones
/// (`//host/...`); the latter two are joined against `origin`.
pub fn qualify_url(origin: &str, raw: &str) -> Result<String, ClientError> {
    if let Ok(abs) = Url::parse(raw) {
        return Ok(abs.into());
    }
    let base = Url::parse(origin)?;
    Ok(base.join(raw)?.into())
}
