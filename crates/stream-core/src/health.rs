//! Mirror discovery and the three-stage health check.
//!
//! Every candidate from the directory (plus the fallback mirror) is probed
//! concurrently: API shape, then video detail, then stream reachability.
//! Each stage only runs if the previous one passed. Mirrors that pass all
//! three are published to the [`InstanceRegistry`] in completion order.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use stream_api::types::{DirectoryEntry, ProbeItem, VideoFormats};
use stream_api::{endpoints, fetch_json, ClientError, MirrorTransport};

use crate::config::{AppConfig, DiscoveryConfig};
use crate::error::DiscoveryError;
use crate::formats;
use crate::models::{HealthStage, Mirror, MirrorStatus};
use crate::registry::InstanceRegistry;

/// Progress notifications for whoever displays mirror availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    StrongInstanceFound(Mirror),
    DiscoveryFailed(String),
    Finished { strong: usize, rejected: usize },
}

/// A mirror that failed a health stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub mirror: Mirror,
    pub stage: HealthStage,
    pub reason: String,
}

/// Outcome of one discovery run.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Strong mirrors in the order their checks completed.
    pub strong: Vec<Mirror>,
    pub rejected: Vec<Rejection>,
}

type StageResult<T> = Result<T, (HealthStage, String)>;

pub struct InstanceHealthChecker<T> {
    transport: T,
    config: DiscoveryConfig,
    directory_timeout: Duration,
    stage_timeout: Duration,
}

impl<T: MirrorTransport> InstanceHealthChecker<T> {
    pub fn new(transport: T, config: &AppConfig) -> Self {
        Self {
            transport,
            config: config.discovery.clone(),
            directory_timeout: config.timeouts.directory(),
            stage_timeout: config.timeouts.health_stage(),
        }
    }

    /// Fetch the health-sorted mirror directory.
    pub async fn fetch_directory(&self) -> Result<Vec<DirectoryEntry>, DiscoveryError> {
        let url = endpoints::directory_url(&self.config.directory_url);
        fetch_json(&self.transport, &url, self.directory_timeout)
            .await
            .map_err(|e| match e {
                ClientError::Parse(msg) => DiscoveryError::Malformed(msg),
                other => DiscoveryError::Unreachable(other),
            })
    }

    /// Directory entries plus the fallback, minus anonymity-network hosts
    /// and duplicates, in directory rank order.
    pub fn candidates(&self, entries: Vec<DirectoryEntry>) -> Vec<Mirror> {
        let uris = entries
            .into_iter()
            .map(|DirectoryEntry(_, instance)| instance.uri)
            .chain(std::iter::once(self.config.fallback_mirror.clone()));

        let mut out: Vec<Mirror> = Vec::new();
        for uri in uris {
            let mirror = match Mirror::parse(&uri) {
                Ok(m) => m,
                Err(e) => {
                    debug!(uri = %uri, error = %e, "Skipping unparseable mirror");
                    continue;
                }
            };
            if mirror.is_anonymity_network() {
                debug!(mirror = %mirror, "Skipping anonymity-network mirror");
                continue;
            }
            if !out.contains(&mirror) {
                out.push(mirror);
            }
        }
        out
    }

    /// Run all three stages against one mirror.
    pub async fn check(&self, mirror: &Mirror) -> MirrorStatus {
        match self.run_stages(mirror).await {
            Ok(()) => MirrorStatus::Strong,
            Err((stage, reason)) => MirrorStatus::Rejected { stage, reason },
        }
    }

    async fn run_stages(&self, mirror: &Mirror) -> StageResult<()> {
        self.check_api_shape(mirror).await?;
        let stream_url = self.check_video_detail(mirror).await?;
        self.check_stream(&stream_url).await
    }

    /// Stage 1: a search returns items carrying a `type` field.
    async fn check_api_shape(&self, mirror: &Mirror) -> StageResult<()> {
        let stage = HealthStage::ApiShape;
        let url = endpoints::probe_search_url(mirror.origin(), &self.config.probe_query);
        let items: Vec<ProbeItem> = fetch_json(&self.transport, &url, self.stage_timeout)
            .await
            .map_err(|e| (stage, e.to_string()))?;

        if items.iter().any(|i| i.kind.is_some()) {
            Ok(())
        } else {
            Err((stage, "no typed search items".into()))
        }
    }

    /// Stage 2: a known video lists an MP4 progressive stream. Returns its URL.
    async fn check_video_detail(&self, mirror: &Mirror) -> StageResult<String> {
        let stage = HealthStage::VideoDetail;
        let url = endpoints::probe_video_url(mirror.origin(), &self.config.probe_video_id);
        let body: VideoFormats = fetch_json(&self.transport, &url, self.stage_timeout)
            .await
            .map_err(|e| (stage, e.to_string()))?;

        if let Some(err) = body.error {
            return Err((stage, format!("mirror error: {err}")));
        }
        let streams = body
            .format_streams
            .ok_or_else(|| (stage, "missing formatStreams".to_string()))?;
        let playable = formats::first_playable(&streams)
            .ok_or_else(|| (stage, "no MP4 progressive stream".to_string()))?;

        endpoints::qualify_url(mirror.origin(), &playable.url).map_err(|e| (stage, e.to_string()))
    }

    /// Stage 3: the stream URL answers a HEAD with 200.
    async fn check_stream(&self, stream_url: &str) -> StageResult<()> {
        let stage = HealthStage::StreamReachability;
        match self.transport.head(stream_url, self.stage_timeout).await {
            Ok(200) => Ok(()),
            Ok(status) => Err((stage, format!("status {status}"))),
            Err(e) => Err((stage, e.to_string())),
        }
    }

    /// Fetch the directory, check every candidate concurrently and publish
    /// strong mirrors as they are confirmed.
    ///
    /// A directory failure is reported once through `events` and returned;
    /// the registry is left untouched in that case. Individual mirror
    /// failures are never errors.
    pub async fn discover(
        &self,
        registry: &InstanceRegistry,
        events: &UnboundedSender<DiscoveryEvent>,
    ) -> Result<DiscoveryReport, DiscoveryError> {
        let entries = match self.fetch_directory().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Mirror discovery failed");
                let _ = events.send(DiscoveryEvent::DiscoveryFailed(e.user_message()));
                return Err(e);
            }
        };

        let mut candidates = self.candidates(entries);
        // The fallback is checked first so a long directory never delays it.
        if let Ok(fallback) = Mirror::parse(&self.config.fallback_mirror) {
            if let Some(pos) = candidates.iter().position(|m| *m == fallback) {
                candidates[..=pos].rotate_right(1);
            }
        }
        let token = registry.begin_refresh();
        info!(candidates = candidates.len(), "Checking mirrors");

        let mut checks = stream::iter(candidates)
            .map(|mirror| async move {
                let status = self.check(&mirror).await;
                (mirror, status)
            })
            .buffer_unordered(self.config.max_concurrent_checks.max(1));

        let mut report = DiscoveryReport::default();
        while let Some((mirror, status)) = checks.next().await {
            match status {
                MirrorStatus::Strong => {
                    info!(mirror = %mirror, "Strong instance found");
                    if registry.append(token, mirror.clone()) {
                        let _ = events.send(DiscoveryEvent::StrongInstanceFound(mirror.clone()));
                    }
                    report.strong.push(mirror);
                }
                MirrorStatus::Rejected { stage, reason } => {
                    debug!(mirror = %mirror, %stage, %reason, "Mirror rejected");
                    report.rejected.push(Rejection {
                        mirror,
                        stage,
                        reason,
                    });
                }
            }
        }

        info!(
            strong = report.strong.len(),
            rejected = report.rejected.len(),
            "Discovery finished"
        );
        let _ = events.send(DiscoveryEvent::Finished {
            strong: report.strong.len(),
            rejected: report.rejected.len(),
        });
        Ok(report)
    }
}
