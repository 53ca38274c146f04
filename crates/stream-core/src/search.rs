//! Federated search with per-hit mirror failover.
//!
//! A page is fetched from the active mirror. Playlists are emitted straight
//! away; every new video hit is resolved concurrently: its detail is fetched,
//! the playback stream is probed, and on any failure the same hit is retried
//! against the next strong mirror. Records reach the consumer in completion
//! order, each identifier at most once per session.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use stream_api::types::{SearchItem, VideoFormats};
use stream_api::{endpoints, fetch_json, ClientError, MirrorTransport};

use crate::config::AppConfig;
use crate::error::{ResolveError, SearchError};
use crate::formats::{DownloadUrls, FormatPolicy};
use crate::models::{
    HitKind, Mirror, PlaylistRecord, SearchHit, SearchOptions, SearchRecord, SortBy, VideoRecord,
};
use crate::session::{SessionTicket, SessionTracker};

/// Delivered to the consumer as results become ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    Result(SearchRecord),
    /// Only raised for the first page; later pages end pagination quietly.
    PageFailed { page: u32, message: String },
}

/// What happened to one page request.
#[derive(Debug)]
pub enum PageOutcome {
    /// This many new records were emitted.
    Emitted(usize),
    /// The page produced nothing new.
    NoResults,
    Failed(SearchError),
    /// The session was superseded; anything late was discarded.
    Stale,
    /// Pagination already ended.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching { page: u32 },
    EmittingResults { page: u32, emitted: usize },
    NoResults { page: u32 },
    Failed { page: u32 },
}

/// Knobs for one search, usually taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub options: SearchOptions,
    pub policy: FormatPolicy,
    pub search_timeout: Duration,
    pub detail_timeout: Duration,
    pub probe_timeout: Duration,
}

impl SearchSettings {
    pub fn from_config(config: &AppConfig, options: SearchOptions) -> Self {
        Self {
            options,
            policy: FormatPolicy::from_config(&config.search),
            search_timeout: config.timeouts.search(),
            detail_timeout: config.timeouts.detail(),
            probe_timeout: config.timeouts.probe(),
        }
    }
}

/// Resolves a video hit to a playable record, failing over across mirrors.
struct Resolver<T> {
    transport: T,
    mirrors: Arc<[Mirror]>,
    active: usize,
    policy: FormatPolicy,
    detail_timeout: Duration,
    probe_timeout: Duration,
}

impl<T: MirrorTransport> Resolver<T> {
    fn active_mirror(&self) -> &Mirror {
        &self.mirrors[self.active]
    }

    /// Try the active mirror, then each following one, until a playback URL
    /// answers the reachability probe.
    async fn resolve(
        &self,
        hit: SearchHit,
        poster_url: Option<String>,
    ) -> (String, Result<VideoRecord, ResolveError>) {
        let mut attempts = 0;
        for mirror in &self.mirrors[self.active..] {
            attempts += 1;
            match self.attempt(mirror, &hit.id).await {
                Ok((playback_url, downloads)) => {
                    let id = hit.id.clone();
                    let record = VideoRecord {
                        id: hit.id,
                        title: hit.title,
                        author: hit.author,
                        duration_seconds: hit.duration_seconds.unwrap_or(0),
                        poster_url,
                        playback_url,
                        audio_download_url: downloads.audio,
                        video_download_url: downloads.video,
                        mirror: mirror.clone(),
                    };
                    return (id, Ok(record));
                }
                Err(e) => {
                    debug!(id = %hit.id, mirror = %mirror, error = %e, "Resolution failed, trying next mirror");
                }
            }
        }
        (hit.id, Err(ResolveError::MirrorsExhausted { attempts }))
    }

    /// One mirror: detail, stream choice, reachability probe.
    async fn attempt(
        &self,
        mirror: &Mirror,
        id: &str,
    ) -> Result<(String, DownloadUrls), ResolveError> {
        let origin = mirror.origin();
        let url = endpoints::video_detail_url(origin, id);
        let formats: VideoFormats = fetch_json(&self.transport, &url, self.detail_timeout).await?;

        if let Some(err) = &formats.error {
            return Err(ResolveError::Refused(err.clone()));
        }

        let downloads = self.policy.downloads(&formats);
        let downloads = DownloadUrls {
            audio: downloads
                .audio
                .and_then(|u| endpoints::qualify_url(origin, &u).ok()),
            video: downloads
                .video
                .and_then(|u| endpoints::qualify_url(origin, &u).ok()),
        };

        let stream = formats
            .format_streams
            .as_deref()
            .and_then(|streams| self.policy.playback(streams))
            .ok_or(ResolveError::NoPlayableStream)?;
        let playback_url = endpoints::qualify_url(origin, &stream.url)?;

        match self.transport.head(&playback_url, self.probe_timeout).await? {
            200 => Ok((playback_url, downloads)),
            status => Err(ResolveError::Unreachable { status }),
        }
    }
}

/// Identifiers already emitted in this session.
#[derive(Debug, Default)]
struct Seen {
    videos: HashSet<String>,
    playlists: HashSet<String>,
}

/// One query's search session against a fixed strong-instance snapshot.
pub struct FederatedSearch<T> {
    resolver: Resolver<T>,
    session: SessionTicket,
    tracker: SessionTracker,
    sort_by: SortBy,
    search_timeout: Duration,
    events: UnboundedSender<SearchEvent>,
    page: u32,
    state: SearchState,
    exhausted: bool,
    seen: Seen,
}

impl<T: MirrorTransport> FederatedSearch<T> {
    /// Fails with [`SearchError::NoStrongInstances`] when `mirrors` is empty.
    pub fn new(
        transport: T,
        mirrors: Arc<[Mirror]>,
        session: SessionTicket,
        tracker: SessionTracker,
        settings: SearchSettings,
        events: UnboundedSender<SearchEvent>,
    ) -> Result<Self, SearchError> {
        if mirrors.is_empty() {
            return Err(SearchError::NoStrongInstances);
        }
        Ok(Self {
            resolver: Resolver {
                transport,
                mirrors,
                active: 0,
                policy: settings.policy,
                detail_timeout: settings.detail_timeout,
                probe_timeout: settings.probe_timeout,
            },
            session,
            tracker,
            sort_by: settings.options.sort_by,
            search_timeout: settings.search_timeout,
            events,
            page: 0,
            state: SearchState::Idle,
            exhausted: false,
            seen: Seen::default(),
        })
    }

    pub fn session(&self) -> &SessionTicket {
        &self.session
    }

    /// [`SearchState::Idle`] once the session has been superseded or cleared.
    pub fn state(&self) -> SearchState {
        if self.tracker.is_current(&self.session) {
            self.state
        } else {
            SearchState::Idle
        }
    }

    /// Last page requested; 0 before the first.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn active_mirror(&self) -> &Mirror {
        self.resolver.active_mirror()
    }

    /// Records emitted so far in this session.
    pub fn emitted(&self) -> usize {
        self.seen.videos.len() + self.seen.playlists.len()
    }

    /// Request the first page.
    pub async fn start(&mut self) -> PageOutcome {
        self.search_page(1).await
    }

    /// Request the page after the last one. Returns
    /// [`PageOutcome::Exhausted`] once pagination has ended.
    pub async fn load_more(&mut self) -> PageOutcome {
        let next = self.page + 1;
        self.search_page(next).await
    }

    /// Fetch and resolve one page. Pages are expected in increasing order;
    /// [`start`](Self::start) and [`load_more`](Self::load_more) guarantee it.
    pub async fn search_page(&mut self, page: u32) -> PageOutcome {
        if !self.tracker.is_current(&self.session) {
            self.state = SearchState::Idle;
            return PageOutcome::Stale;
        }
        if self.exhausted {
            return PageOutcome::Exhausted;
        }

        self.page = page;
        self.state = SearchState::Searching { page };
        let origin = self.resolver.active_mirror().origin().to_string();
        let url = endpoints::search_url(
            &origin,
            self.session.query(),
            page,
            Some(self.sort_by.as_param()),
        );
        let result: Result<Vec<SearchItem>, ClientError> =
            fetch_json(&self.resolver.transport, &url, self.search_timeout).await;

        if !self.tracker.is_current(&self.session) {
            debug!(session = self.session.id(), page, "Session superseded, discarding page");
            self.state = SearchState::Idle;
            return PageOutcome::Stale;
        }

        let items = match result {
            Ok(items) => items,
            Err(e) => return self.page_failed(page, e),
        };

        if items.is_empty() {
            info!(query = %self.session.query(), page, "No more results");
            self.exhausted = true;
            self.state = SearchState::NoResults { page };
            return PageOutcome::NoResults;
        }

        let mut emitted = 0;
        let mut in_flight = HashSet::new();
        let mut pending = FuturesUnordered::new();

        for item in items {
            let Some(hit) = SearchHit::from_item(item) else {
                continue;
            };
            match hit.kind {
                HitKind::Video => {
                    if self.seen.videos.contains(&hit.id) || !in_flight.insert(hit.id.clone()) {
                        debug!(id = %hit.id, "Skipping duplicate video");
                        continue;
                    }
                    let poster_url = hit.poster_url(&origin);
                    pending.push(self.resolver.resolve(hit, poster_url));
                }
                HitKind::Playlist => {
                    if !self.seen.playlists.insert(hit.id.clone()) {
                        debug!(id = %hit.id, "Skipping duplicate playlist");
                        continue;
                    }
                    let record = PlaylistRecord {
                        poster_url: hit.poster_url(&origin),
                        id: hit.id,
                        title: hit.title,
                        author: hit.author,
                        item_count: hit.item_count.unwrap_or(0),
                    };
                    let _ = self
                        .events
                        .send(SearchEvent::Result(SearchRecord::Playlist(record)));
                    emitted += 1;
                    self.state = SearchState::EmittingResults { page, emitted };
                }
                HitKind::Channel => {}
            }
        }

        while let Some((id, result)) = pending.next().await {
            if !self.tracker.is_current(&self.session) {
                debug!(session = self.session.id(), page, "Session superseded, discarding results");
                self.state = SearchState::Idle;
                return PageOutcome::Stale;
            }
            match result {
                Ok(record) => {
                    if self.seen.videos.insert(record.id.clone()) {
                        let _ = self
                            .events
                            .send(SearchEvent::Result(SearchRecord::Video(record)));
                        emitted += 1;
                        self.state = SearchState::EmittingResults { page, emitted };
                    }
                }
                Err(e) => debug!(id = %id, error = %e, "Dropping unresolvable hit"),
            }
        }

        if emitted == 0 {
            self.state = SearchState::NoResults { page };
            return PageOutcome::NoResults;
        }
        info!(query = %self.session.query(), page, emitted, "Page complete");
        PageOutcome::Emitted(emitted)
    }

    fn page_failed(&mut self, page: u32, error: ClientError) -> PageOutcome {
        self.state = SearchState::Failed { page };
        self.exhausted = true;
        let error = SearchError::Client(error);
        if page == 1 {
            warn!(query = %self.session.query(), error = %error, "Search failed");
            let _ = self.events.send(SearchEvent::PageFailed {
                page,
                message: error.user_message(),
            });
        } else {
            debug!(page, error = %error, "Page failed, treating as end of results");
        }
        PageOutcome::Failed(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{formats_body, playlist_item, video_item, FakeTransport, Reply};
    use serde_json::json;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    const A: &str = "https://a.example";
    const B: &str = "https://b.example";
    const QUERY: &str = "librem 5";

    fn mirrors(origins: &[&str]) -> Arc<[Mirror]> {
        origins
            .iter()
            .map(|o| Mirror::parse(o).unwrap())
            .collect::<Vec<_>>()
            .into()
    }

    fn search_with(
        fake: &FakeTransport,
        origins: &[&str],
        options: SearchOptions,
    ) -> (
        FederatedSearch<FakeTransport>,
        SessionTracker,
        UnboundedReceiver<SearchEvent>,
    ) {
        let tracker = SessionTracker::new();
        let ticket = tracker.begin(QUERY);
        let settings = SearchSettings::from_config(&AppConfig::default(), options);
        let (tx, rx) = mpsc::unbounded_channel();
        let search = FederatedSearch::new(
            fake.clone(),
            mirrors(origins),
            ticket,
            tracker.clone(),
            settings,
            tx,
        )
        .unwrap();
        (search, tracker, rx)
    }

    fn search(
        fake: &FakeTransport,
        origins: &[&str],
    ) -> (
        FederatedSearch<FakeTransport>,
        SessionTracker,
        UnboundedReceiver<SearchEvent>,
    ) {
        search_with(fake, origins, SearchOptions::default())
    }

    fn page_url(page: u32) -> String {
        endpoints::search_url(A, QUERY, page, Some("relevance"))
    }

    /// Script `id` on `origin` with its 360p probe answering `status`.
    fn video(fake: &FakeTransport, origin: &str, id: &str, status: u16, delay: Duration) {
        fake.on_get_json(
            endpoints::video_detail_url(origin, id),
            formats_body(&format!("{origin}/s"), id),
        );
        fake.on_head_delayed(format!("{origin}/s/{id}/360.mp4"), status, delay);
    }

    fn drain(rx: &mut UnboundedReceiver<SearchEvent>) -> Vec<SearchEvent> {
        let mut out = Vec::new();
        while let Ok(e) = rx.try_recv() {
            out.push(e);
        }
        out
    }

    fn result_ids(events: &[SearchEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                SearchEvent::Result(r) => Some(r.id().to_string()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_video_and_playlist_records() {
        let fake = FakeTransport::new();
        fake.on_get_json(
            page_url(1),
            json!([
                video_item("v1", "Librem 5 review"),
                playlist_item("PL1", "pv1", 7),
                {"type": "channel", "author": "Purism", "authorId": "UC1"}
            ]),
        );
        video(&fake, A, "v1", 200, Duration::ZERO);

        let (mut search, _tracker, mut rx) = search(&fake, &[A]);
        let outcome = search.start().await;
        assert!(matches!(outcome, PageOutcome::Emitted(2)));
        assert_eq!(search.state(), SearchState::EmittingResults { page: 1, emitted: 2 });

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);

        let SearchEvent::Result(SearchRecord::Playlist(playlist)) = &events[0] else {
            panic!("expected playlist first, got {:?}", events[0]);
        };
        assert_eq!(playlist.id, "PL1");
        assert_eq!(playlist.item_count, 7);
        assert_eq!(
            playlist.poster_url.as_deref(),
            Some("https://a.example/vi/pv1/mqdefault.jpg")
        );

        let SearchEvent::Result(SearchRecord::Video(video)) = &events[1] else {
            panic!("expected video, got {:?}", events[1]);
        };
        assert_eq!(video.id, "v1");
        assert_eq!(video.title, "Librem 5 review");
        assert_eq!(video.duration_seconds, 120);
        assert_eq!(
            video.poster_url.as_deref(),
            Some("https://a.example/vi/v1/mqdefault.jpg")
        );
        assert_eq!(video.playback_url, "https://a.example/s/v1/360.mp4");
        assert_eq!(
            video.audio_download_url.as_deref(),
            Some("https://a.example/s/v1/a256.m4a")
        );
        assert_eq!(
            video.video_download_url.as_deref(),
            Some("https://a.example/s/v1/720.mp4")
        );
        assert_eq!(video.mirror.origin(), A);

        // Playlists are not stream-resolved.
        assert_eq!(fake.count_containing("/api/v1/videos/PL1"), 0);
        assert_eq!(fake.count_containing("/api/v1/videos/pv1"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failover_on_unreachable_stream() {
        let fake = FakeTransport::new();
        fake.on_get_json(page_url(1), json!([video_item("v1", "t")]));
        video(&fake, A, "v1", 404, Duration::ZERO);
        video(&fake, B, "v1", 200, Duration::ZERO);

        let (mut search, _tracker, mut rx) = search(&fake, &[A, B]);
        search.start().await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        let SearchEvent::Result(SearchRecord::Video(video)) = &events[0] else {
            panic!("expected video");
        };
        assert_eq!(video.mirror.origin(), B);
        assert_eq!(video.playback_url, "https://b.example/s/v1/360.mp4");
        // The search itself stays on the active mirror.
        assert_eq!(search.active_mirror().origin(), A);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failover_on_detail_timeout_and_refusal() {
        let fake = FakeTransport::new();
        fake.on_get_json(page_url(1), json!([video_item("v1", "t"), video_item("v2", "t")]));
        fake.on_get(
            endpoints::video_detail_url(A, "v1"),
            Reply::Status(200, "{}".into()),
            Duration::from_secs(6),
        );
        fake.on_get_json(
            endpoints::video_detail_url(A, "v2"),
            json!({"error": "This video is unavailable"}),
        );
        video(&fake, B, "v1", 200, Duration::ZERO);
        video(&fake, B, "v2", 200, Duration::ZERO);

        let (mut search, _tracker, mut rx) = search(&fake, &[A, B]);
        assert!(matches!(search.start().await, PageOutcome::Emitted(2)));

        for event in drain(&mut rx) {
            let SearchEvent::Result(SearchRecord::Video(video)) = event else {
                panic!("expected video");
            };
            assert_eq!(video.mirror.origin(), B);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_mirrors_drop_hit_silently() {
        let fake = FakeTransport::new();
        fake.on_get_json(page_url(1), json!([video_item("v1", "t")]));
        fake.on_get(
            endpoints::video_detail_url(A, "v1"),
            Reply::Network,
            Duration::ZERO,
        );
        // B has no 360p stream.
        fake.on_get_json(
            endpoints::video_detail_url(B, "v1"),
            json!({"formatStreams": [{"url": "https://b.example/720.mp4", "type": "video/mp4", "qualityLabel": "720p"}]}),
        );

        let (mut search, _tracker, mut rx) = search(&fake, &[A, B]);
        assert!(matches!(search.start().await, PageOutcome::NoResults));
        assert!(drain(&mut rx).is_empty());
        assert_eq!(search.state(), SearchState::NoResults { page: 1 });
        assert!(!search.is_exhausted());
        assert_eq!(fake.count_containing("HEAD"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_duplicate_ids_across_pages() {
        let fake = FakeTransport::new();
        fake.on_get_json(
            page_url(1),
            json!([
                video_item("v1", "t"),
                video_item("v1", "t"),
                video_item("v2", "t"),
                playlist_item("PL1", "pv1", 1)
            ]),
        );
        fake.on_get_json(
            page_url(2),
            json!([
                video_item("v2", "t"),
                video_item("v3", "t"),
                playlist_item("PL1", "pv1", 1)
            ]),
        );
        video(&fake, A, "v1", 404, Duration::ZERO);
        video(&fake, B, "v1", 200, Duration::ZERO);
        video(&fake, A, "v2", 200, Duration::ZERO);
        video(&fake, A, "v3", 200, Duration::ZERO);

        let (mut search, _tracker, mut rx) = search(&fake, &[A, B]);
        assert!(matches!(search.start().await, PageOutcome::Emitted(3)));
        assert!(matches!(search.load_more().await, PageOutcome::Emitted(1)));

        let mut ids = result_ids(&drain(&mut rx));
        ids.sort();
        assert_eq!(ids, vec!["PL1", "v1", "v2", "v3"]);
        assert_eq!(fake.count_containing("GET https://a.example/api/v1/videos/v1"), 1);
        assert_eq!(fake.count_containing("GET https://a.example/api/v1/videos/v2"), 1);
        assert_eq!(search.emitted(), 4);
        assert_eq!(search.page(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_page_failure_surfaces_once() {
        let fake = FakeTransport::new();
        fake.on_get(page_url(1), Reply::Status(500, String::new()), Duration::ZERO);

        let (mut search, _tracker, mut rx) = search(&fake, &[A]);
        assert!(matches!(search.start().await, PageOutcome::Failed(_)));
        assert_eq!(search.state(), SearchState::Failed { page: 1 });
        assert!(matches!(search.load_more().await, PageOutcome::Exhausted));

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![SearchEvent::PageFailed {
                page: 1,
                message: "There is no response from the streaming servers.".into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_page_failure_is_silent() {
        let fake = FakeTransport::new();
        fake.on_get_json(page_url(1), json!([video_item("v1", "t")]));
        fake.on_get_json(page_url(2), json!([video_item("v2", "t")]));
        fake.on_get(page_url(3), Reply::Timeout, Duration::ZERO);
        video(&fake, A, "v1", 200, Duration::ZERO);
        video(&fake, A, "v2", 200, Duration::ZERO);

        let (mut search, _tracker, mut rx) = search(&fake, &[A]);
        search.start().await;
        search.load_more().await;
        assert!(matches!(search.load_more().await, PageOutcome::Failed(_)));
        assert!(search.is_exhausted());

        let events = drain(&mut rx);
        assert_eq!(result_ids(&events), vec!["v1", "v2"]);
        assert!(!events
            .iter()
            .any(|e| matches!(e, SearchEvent::PageFailed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_first_page_message() {
        let fake = FakeTransport::new();
        fake.on_get(page_url(1), Reply::Status(200, "oops".into()), Duration::ZERO);

        let (mut search, _tracker, mut rx) = search(&fake, &[A]);
        search.start().await;
        assert_eq!(
            drain(&mut rx),
            vec![SearchEvent::PageFailed {
                page: 1,
                message: "The streaming server response failed to parse results.".into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_emitted_in_completion_order() {
        let fake = FakeTransport::new();
        fake.on_get_json(page_url(1), json!([video_item("v1", "t"), video_item("v2", "t")]));
        video(&fake, A, "v1", 200, Duration::from_millis(1500));
        video(&fake, A, "v2", 200, Duration::from_millis(100));

        let (mut search, _tracker, mut rx) = search(&fake, &[A]);
        search.start().await;
        assert_eq!(result_ids(&drain(&mut rx)), vec!["v2", "v1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_session_discards_late_results() {
        let fake = FakeTransport::new();
        fake.on_get_json(page_url(1), json!([video_item("v1", "t")]));
        video(&fake, A, "v1", 200, Duration::from_millis(1500));

        let (mut search, tracker, mut rx) = search(&fake, &[A]);
        let (outcome, _) = tokio::join!(search.start(), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            tracker.begin("something else");
        });

        assert!(matches!(outcome, PageOutcome::Stale));
        assert!(drain(&mut rx).is_empty());
        assert_eq!(search.state(), SearchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleared_session_returns_to_idle() {
        let fake = FakeTransport::new();
        fake.on_get_json(page_url(1), json!([video_item("v1", "t")]));
        video(&fake, A, "v1", 200, Duration::ZERO);

        let (mut search, tracker, _rx) = search(&fake, &[A]);
        search.start().await;
        assert_eq!(search.state(), SearchState::EmittingResults { page: 1, emitted: 1 });

        tracker.clear();
        assert_eq!(search.state(), SearchState::Idle);
        assert!(matches!(search.load_more().await, PageOutcome::Stale));
        assert_eq!(search.state(), SearchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_first_page_times_out() {
        let fake = FakeTransport::new();
        fake.on_get(page_url(1), Reply::Status(200, "[]".into()), Duration::from_secs(6));

        let (mut search, _tracker, mut rx) = search(&fake, &[A]);
        let started = tokio::time::Instant::now();
        let outcome = search.start().await;

        assert!(matches!(
            outcome,
            PageOutcome::Failed(SearchError::Client(ClientError::Timeout))
        ));
        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert_eq!(
            drain(&mut rx),
            vec![SearchEvent::PageFailed {
                page: 1,
                message: "There is no response from the streaming servers.".into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleared_session_makes_no_requests() {
        let fake = FakeTransport::new();
        let (mut search, tracker, _rx) = search(&fake, &[A]);
        tracker.clear();
        assert!(matches!(search.start().await, PageOutcome::Stale));
        assert!(fake.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_page_ends_pagination() {
        let fake = FakeTransport::new();
        fake.on_get_json(page_url(1), json!([video_item("v1", "t")]));
        fake.on_get_json(page_url(2), json!([]));
        video(&fake, A, "v1", 200, Duration::ZERO);

        let (mut search, _tracker, _rx) = search(&fake, &[A]);
        search.start().await;
        assert!(matches!(search.load_more().await, PageOutcome::NoResults));
        assert!(matches!(search.load_more().await, PageOutcome::Exhausted));
        assert_eq!(fake.count_containing("page=3"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sort_order_sent_with_search() {
        let fake = FakeTransport::new();
        let url = endpoints::search_url(A, QUERY, 1, Some("upload_date"));
        fake.on_get_json(url.clone(), json!([]));

        let (mut search, _tracker, _rx) = search_with(
            &fake,
            &[A],
            SearchOptions {
                sort_by: SortBy::UploadDate,
            },
        );
        search.start().await;
        assert_eq!(fake.requests(), vec![format!("GET {url}")]);
    }

    #[test]
    fn test_empty_mirror_list_is_an_error() {
        let tracker = SessionTracker::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = FederatedSearch::new(
            FakeTransport::new(),
            mirrors(&[]),
            tracker.begin(QUERY),
            tracker,
            SearchSettings::from_config(&AppConfig::default(), SearchOptions::default()),
            tx,
        );
        assert!(matches!(result, Err(SearchError::NoStrongInstances)));
    }
}
