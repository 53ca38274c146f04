//! Search session identity.
//!
//! Every query gets a [`SessionTicket`]. Starting a new query or clearing the
//! results supersedes the previous ticket, and late completions check
//! [`SessionTracker::is_current`] before emitting anything.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Immutable identity of one query's execution.
#[derive(Debug, Clone)]
pub struct SessionTicket {
    id: u64,
    query: Arc<str>,
    started_at: DateTime<Utc>,
}

impl SessionTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Tracks which session is current. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    current: Arc<AtomicU64>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `query`, superseding any previous one.
    pub fn begin(&self, query: &str) -> SessionTicket {
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        SessionTicket {
            id,
            query: Arc::from(query),
            started_at: Utc::now(),
        }
    }

    /// Drop the current session without starting another.
    pub fn clear(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: &SessionTicket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.id
    }
}
