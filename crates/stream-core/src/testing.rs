//! In-memory transport and API fixtures for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use stream_api::{ClientError, MirrorTransport, RawResponse};

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    Network,
    Timeout,
}

#[derive(Debug, Clone)]
struct Route {
    reply: Reply,
    delay: Duration,
}

#[derive(Debug, Default)]
struct State {
    get: HashMap<String, Route>,
    head: HashMap<String, Route>,
    log: Vec<String>,
}

/// Serves scripted replies by exact URL and records every request.
/// Unrouted URLs answer 404. Delays use tokio's clock, so tests run with
/// `start_paused = true`.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<State>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(&self, url: impl Into<String>, reply: Reply, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .get
            .insert(url.into(), Route { reply, delay });
    }

    pub fn on_get_json(&self, url: impl Into<String>, body: Value) {
        self.on_get(url, Reply::Status(200, body.to_string()), Duration::ZERO);
    }

    pub fn on_head(&self, url: impl Into<String>, status: u16) {
        self.on_head_delayed(url, status, Duration::ZERO);
    }

    pub fn on_head_delayed(&self, url: impl Into<String>, status: u16, delay: Duration) {
        self.state.lock().unwrap().head.insert(
            url.into(),
            Route {
                reply: Reply::Status(status, String::new()),
                delay,
            },
        );
    }

    /// Every request seen so far, as `"GET url"` / `"HEAD url"`.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    /// Number of requests whose URL contains `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.requests().iter().filter(|r| r.contains(needle)).count()
    }

    fn route(&self, method: &str, url: &str) -> Route {
        let mut state = self.state.lock().unwrap();
        state.log.push(format!("{method} {url}"));
        let table = if method == "HEAD" { &state.head } else { &state.get };
        table.get(url).cloned().unwrap_or(Route {
            reply: Reply::Status(404, String::new()),
            delay: Duration::ZERO,
        })
    }

    async fn serve(route: Route, timeout: Duration) -> Result<RawResponse, ClientError> {
        if route.delay >= timeout {
            tokio::time::sleep(timeout).await;
            return Err(ClientError::Timeout);
        }
        tokio::time::sleep(route.delay).await;
        match route.reply {
            Reply::Status(status, body) => Ok(RawResponse {
                status,
                body: body.into_bytes(),
            }),
            Reply::Network => Err(ClientError::Network("connection refused".into())),
            Reply::Timeout => {
                tokio::time::sleep(timeout - route.delay).await;
                Err(ClientError::Timeout)
            }
        }
    }
}

impl MirrorTransport for FakeTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<RawResponse, ClientError> {
        let route = self.route("GET", url);
        Self::serve(route, timeout).await
    }

    async fn head(&self, url: &str, timeout: Duration) -> Result<u16, ClientError> {
        let route = self.route("HEAD", url);
        Self::serve(route, timeout).await.map(|r| r.status)
    }
}

// ── Fixtures ────────────────────────────────────────────────────

pub fn video_item(id: &str, title: &str) -> Value {
    json!({
        "type": "video",
        "title": title,
        "videoId": id,
        "author": "Purism",
        "lengthSeconds": 120,
        "videoThumbnails": [
            {"quality": "high", "url": format!("https://i.ytimg.com/vi/{id}/hq.jpg")},
            {"quality": "medium", "url": format!("/vi/{id}/mqdefault.jpg")}
        ]
    })
}

pub fn playlist_item(id: &str, first_video: &str, count: u32) -> Value {
    json!({
        "type": "playlist",
        "title": format!("Playlist {id}"),
        "playlistId": id,
        "author": "Purism",
        "videoCount": count,
        "videos": [
            {"title": "first", "videoId": first_video, "lengthSeconds": 30,
             "videoThumbnails": [{"quality": "medium", "url": format!("/vi/{first_video}/mqdefault.jpg")}]}
        ]
    })
}

/// Detail body with a 360p and 720p progressive stream plus two MP4 audio
/// tracks, all hosted on `stream_host`.
pub fn formats_body(stream_host: &str, id: &str) -> Value {
    json!({
        "formatStreams": [
            {"url": format!("{stream_host}/{id}/360.mp4"), "type": "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"",
             "quality": "medium", "qualityLabel": "360p"},
            {"url": format!("{stream_host}/{id}/720.mp4"), "type": "video/mp4; codecs=\"avc1.64001F, mp4a.40.2\"",
             "quality": "hd720", "qualityLabel": "720p"}
        ],
        "adaptiveFormats": [
            {"url": format!("{stream_host}/{id}/a128.m4a"), "type": "audio/mp4; codecs=\"mp4a.40.2\"", "bitrate": "128000"},
            {"url": format!("{stream_host}/{id}/a256.m4a"), "type": "audio/mp4; codecs=\"mp4a.40.2\"", "bitrate": "256000"},
            {"url": format!("{stream_host}/{id}/opus.webm"), "type": "audio/webm; codecs=\"opus\"", "bitrate": "300000"}
        ]
    })
}
