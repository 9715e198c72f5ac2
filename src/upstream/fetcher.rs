//! Transport-agnostic outbound fetch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::config::{Transport, UpstreamConfig};
use crate::upstream::hyper_client::HyperFetcher;
use crate::upstream::reqwest_client::ReqwestFetcher;

/// Why an outbound call produced no body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The transport cannot perform this request at all.
    #[error("unsupported request {url}: {reason}")]
    Unsupported { url: String, reason: String },
}

impl FetchError {
    /// Description without the URL. URLs embed the client address, so this
    /// is the form that goes into logs.
    pub fn cause(&self) -> String {
        match self {
            FetchError::Timeout { timeout, .. } => format!("timed out after {:?}", timeout),
            FetchError::Connect { reason, .. } => format!("connection failed: {}", reason),
            FetchError::Status { status, .. } => format!("HTTP {}", status),
            FetchError::Transport { reason, .. } => format!("transport error: {}", reason),
            FetchError::Unsupported { reason, .. } => format!("unsupported request: {}", reason),
        }
    }
}

/// An outbound HTTP GET with a deadline.
///
/// Implementations send the configured User-Agent plus `headers`, treat any
/// non-2xx status as a failure and never retry.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Bytes, FetchError>;

    /// Transport name for logs.
    fn name(&self) -> &'static str;
}

/// Build the configured transport.
pub fn build_fetcher(config: &UpstreamConfig) -> Result<Arc<dyn Fetcher>, FetchError> {
    let fetcher: Arc<dyn Fetcher> = match config.transport {
        Transport::Reqwest => Arc::new(ReqwestFetcher::new(&config.user_agent)?),
        Transport::Hyper => Arc::new(HyperFetcher::new(&config.user_agent)),
    };
    tracing::info!(transport = fetcher.name(), "Upstream fetcher ready");
    Ok(fetcher)
}
