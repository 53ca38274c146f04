//! The strong-instance list.
//!
//! Readers take an immutable [`InstanceSnapshot`]; writers replace the whole
//! list, so a search session never observes a list changing under it.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::models::Mirror;

/// A point-in-time view of the strong instances, in discovery order.
#[derive(Debug, Clone)]
pub struct InstanceSnapshot {
    pub generation: u64,
    pub mirrors: Arc<[Mirror]>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl InstanceSnapshot {
    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }
}

/// Issued to one discovery run. Publications carrying a superseded
/// generation are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshToken {
    generation: u64,
}

#[derive(Debug)]
struct State {
    visible: InstanceSnapshot,
    /// Generation of the most recent refresh run.
    latest: u64,
}

#[derive(Debug)]
pub struct InstanceRegistry {
    state: RwLock<State>,
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                visible: InstanceSnapshot {
                    generation: 0,
                    mirrors: Arc::from(Vec::new()),
                    refreshed_at: None,
                },
                latest: 0,
            }),
        }
    }

    pub fn snapshot(&self) -> InstanceSnapshot {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .visible
            .clone()
    }

    /// Start a refresh run. The current list stays visible until the run
    /// publishes its first mirror; a run that finds none leaves it in place.
    pub fn begin_refresh(&self) -> RefreshToken {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.latest += 1;
        RefreshToken {
            generation: state.latest,
        }
    }

    /// Publish a new snapshot with `mirror` added. The first mirror of a run
    /// replaces the previous run's list. Returns `false` if the token was
    /// superseded by a later refresh or the mirror is already listed.
    pub fn append(&self, token: RefreshToken, mirror: Mirror) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.latest != token.generation {
            return false;
        }
        let mut mirrors = if state.visible.generation == token.generation {
            if state.visible.mirrors.contains(&mirror) {
                return false;
            }
            state.visible.mirrors.to_vec()
        } else {
            Vec::new()
        };
        mirrors.push(mirror);
        state.visible = InstanceSnapshot {
            generation: token.generation,
            mirrors: Arc::from(mirrors),
            refreshed_at: Some(Utc::now()),
        };
        true
    }
}
