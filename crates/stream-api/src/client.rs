use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::transport::{MirrorTransport, RawResponse};

const USER_AGENT: &str = concat!("stream/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed [`MirrorTransport`]. Cheap to clone; clones share one
/// connection pool.
#[derive(Debug, Clone)]
pub struct MirrorClient {
    http: Client,
}

impl Default for MirrorClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorClient {
    pub fn new() -> Self {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to default HTTP client");
                Client::new()
            });
        Self { http }
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

impl MirrorTransport for MirrorClient {
    async fn get(&self, url: &str, timeout: Duration) -> Result<RawResponse, ClientError> {
        let resp = self.http.get(url).timeout(timeout).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        tracing::trace!(url, status, bytes = body.len(), "GET");
        Ok(RawResponse { status, body })
    }

    async fn head(&self, url: &str, timeout: Duration) -> Result<u16, ClientError> {
        let resp = self.http.head(url).timeout(timeout).send().await?;
        let status = resp.status().as_u16();
        tracing::trace!(url, status, "HEAD");
        Ok(status)
    }
}

/// Decode a JSON body. Failure is always [`ClientError::Parse`], never a
/// network error.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body).map_err(|e| ClientError::Parse(e.to_string()))
}

/// GET `url`, require HTTP 200 and decode the body as `T`.
pub async fn fetch_json<T, C>(client: &C, url: &str, timeout: Duration) -> Result<T, ClientError>
where
    T: DeserializeOwned,
    C: MirrorTransport,
{
    let resp = client.get(url, timeout).await?;
    if !resp.is_ok() {
        return Err(ClientError::Status {
            status: resp.status,
        });
    }
    parse_json(&resp.body)
}
