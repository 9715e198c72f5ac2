//! Minimal fallback transport on the hyper-util client. Plain HTTP only;
//! HTTPS URLs fail with [`FetchError::Unsupported`].

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Uri},
};
use bytes::Bytes;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::upstream::fetcher::{FetchError, Fetcher};

/// Upper bound on an upstream body; provider payloads are a few hundred bytes.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub struct HyperFetcher {
    client: Client<HttpConnector, Body>,
    user_agent: String,
}

impl HyperFetcher {
    pub fn new(user_agent: &str) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            user_agent: user_agent.to_string(),
        }
    }

    fn build_request(&self, url: &str, headers: &[(&str, &str)]) -> Result<Request<Body>, FetchError> {
        let unsupported = |reason: String| FetchError::Unsupported { url: url.to_string(), reason };

        let uri: Uri = url.parse().map_err(|e| unsupported(format!("invalid URL: {}", e)))?;
        if uri.scheme_str() != Some("http") {
            return Err(unsupported("only plain http is available on this transport".to_string()));
        }

        let mut builder = Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::USER_AGENT, self.user_agent.as_str());
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder
            .body(Body::empty())
            .map_err(|e| unsupported(format!("invalid request: {}", e)))
    }

    async fn send(&self, url: &str, request: Request<Body>) -> Result<Bytes, FetchError> {
        let response = self.client.request(request).await.map_err(|e| {
            if e.is_connect() {
                FetchError::Connect { url: url.to_string(), reason: e.to_string() }
            } else {
                FetchError::Transport { url: url.to_string(), reason: e.to_string() }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }

        axum::body::to_bytes(Body::new(response.into_body()), MAX_BODY_BYTES)
            .await
            .map_err(|e| FetchError::Transport { url: url.to_string(), reason: e.to_string() })
    }
}

#[async_trait]
impl Fetcher for HyperFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Bytes, FetchError> {
        let request = self.build_request(url, headers)?;
        match tokio::time::timeout(timeout, self.send(url, request)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout { url: url.to_string(), timeout }),
        }
    }

    fn name(&self) -> &'static str {
        "hyper"
    }
}
