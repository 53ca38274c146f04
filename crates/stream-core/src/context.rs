//! Shared application state: configuration, transport, the strong-instance
//! registry and the current search session.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use stream_api::{MirrorClient, MirrorTransport};

use crate::config::AppConfig;
use crate::error::{CoreError, DiscoveryError, SearchError};
use crate::health::{DiscoveryEvent, DiscoveryReport, InstanceHealthChecker};
use crate::models::SearchOptions;
use crate::registry::InstanceRegistry;
use crate::search::{FederatedSearch, SearchEvent, SearchSettings};
use crate::session::SessionTracker;

pub struct AppContext<T> {
    config: AppConfig,
    transport: T,
    registry: Arc<InstanceRegistry>,
    sessions: SessionTracker,
}

impl AppContext<MirrorClient> {
    /// Load the user's config and use the real HTTP client.
    pub fn load() -> Result<Self, CoreError> {
        Ok(Self::new(AppConfig::load()?, MirrorClient::new()))
    }
}

impl<T: MirrorTransport + Clone> AppContext<T> {
    pub fn new(config: AppConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            registry: Arc::new(InstanceRegistry::new()),
            sessions: SessionTracker::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<InstanceRegistry> {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    pub fn health_checker(&self) -> InstanceHealthChecker<T> {
        InstanceHealthChecker::new(self.transport.clone(), &self.config)
    }

    /// Refresh the strong-instance list.
    pub async fn discover(
        &self,
        events: &UnboundedSender<DiscoveryEvent>,
    ) -> Result<DiscoveryReport, DiscoveryError> {
        self.health_checker().discover(&self.registry, events).await
    }

    /// Begin a new search session, superseding any previous one, against the
    /// strong instances known right now. Call [`FederatedSearch::start`] on
    /// the result to fetch the first page.
    pub fn start_search(
        &self,
        query: &str,
        options: SearchOptions,
        events: UnboundedSender<SearchEvent>,
    ) -> Result<FederatedSearch<T>, SearchError> {
        let snapshot = self.registry.snapshot();
        let session = self.sessions.begin(query);
        info!(
            query,
            session = session.id(),
            mirrors = snapshot.mirrors.len(),
            generation = snapshot.generation,
            "Starting search"
        );
        FederatedSearch::new(
            self.transport.clone(),
            snapshot.mirrors,
            session,
            self.sessions.clone(),
            SearchSettings::from_config(&self.config, options),
            events,
        )
    }

    /// Abandon the current search. Late results are discarded.
    pub fn clear_search(&self) {
        self.sessions.clear();
    }
}
