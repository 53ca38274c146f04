//! The request seam shared by the health checker and the search pipeline.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;

/// A completed HTTP exchange. Non-200 statuses are not errors at this level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Minimal HTTP surface needed to talk to a mirror.
///
/// Implementations enforce `timeout` per request and report a timeout as
/// [`ClientError::Timeout`]. A response with any status is `Ok`.
pub trait MirrorTransport: Send + Sync {
    /// Issue a GET and return the raw status and body.
    fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<RawResponse, ClientError>> + Send;

    /// Issue a HEAD for reachability probing. Returns the status only.
    fn head(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<u16, ClientError>> + Send;
}
