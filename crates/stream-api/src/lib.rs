//! HTTP/JSON access to Invidious-compatible video mirrors.
//!
//! The [`MirrorTransport`] trait is the seam between the search pipeline
//! and the network; [`MirrorClient`] is the production implementation.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{fetch_json, parse_json, MirrorClient};
pub use error::ClientError;
pub use transport::{MirrorTransport, RawResponse};
