//! Pinned HTTP transport.
//!
//! One [`Transport::send`] is one request on the wire: no redirect following,
//! no proxy, and the connection may only go to the addresses the resolver
//! guard vetted. Redirects, retries and policy live above this layer.

mod easy;
mod parse;
#[cfg(test)]
mod test_server;

pub use easy::CurlTransport;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::TransferLimits;
use crate::error::FetchError;
use crate::resolver::ResolvedHost;

/// Everything needed to send one GET.
#[derive(Debug, Clone)]
pub struct HopRequest {
    pub url: Url,
    /// Addresses the connection is restricted to.
    pub pinned: ResolvedHost,
    pub limits: TransferLimits,
    pub user_agent: String,
    pub cancel: CancellationToken,
}

/// A complete response for one hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw `Location` header, unresolved.
    pub location: Option<String>,
    pub body: Vec<u8>,
}

/// Sends a single request to a pinned host.
///
/// Implementations must fail with `ResponseTooLarge` rather than return more
/// than `limits.max_response_bytes` of body, and must stop promptly once
/// `cancel` fires.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, req: HopRequest) -> Result<HttpResponse, FetchError>;
}
