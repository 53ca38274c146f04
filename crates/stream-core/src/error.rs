use thiserror::Error;

use stream_api::ClientError;

/// Configuration and filesystem failures.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The mirror directory could not be fetched or decoded. Reported once per
/// discovery run.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    #[error("no instances found: {0}")]
    Unreachable(ClientError),

    #[error("instance list is malformed: {0}")]
    Malformed(String),
}

impl DiscoveryError {
    /// Message suitable for a user-facing error box.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unreachable(_) => "No instances found, cannot complete search.".into(),
            Self::Malformed(_) => "Instances are malformed, cannot complete search.".into(),
        }
    }
}

/// Why a single hit could not be resolved against one mirror, or at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("mirror refused video: {0}")]
    Refused(String),

    #[error("no playable stream")]
    NoPlayableStream,

    #[error("stream unreachable (status {status})")]
    Unreachable { status: u16 },

    #[error("all {attempts} mirrors failed")]
    MirrorsExhausted { attempts: usize },
}

/// Errors raised to the caller of a search.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("no strong instances found to do search against")]
    NoStrongInstances,

    #[error("search request failed: {0}")]
    Client(#[from] ClientError),
}

impl SearchError {
    /// Message suitable for a user-facing error box.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoStrongInstances => "No strong instances found to do search against.".into(),
            Self::Client(ClientError::Parse(_)) => {
                "The streaming server response failed to parse results.".into()
            }
            Self::Client(_) => "There is no response from the streaming servers.".into(),
        }
    }
}
