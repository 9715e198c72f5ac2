//! Full-featured transport backed by reqwest (HTTP and HTTPS).

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::upstream::fetcher::{FetchError, Fetcher};

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Unsupported {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    fn map_error(url: &str, timeout: Duration, e: reqwest::Error) -> FetchError {
        let e = e.without_url();
        if e.is_timeout() {
            FetchError::Timeout { url: url.to_string(), timeout }
        } else if e.is_connect() {
            FetchError::Connect { url: url.to_string(), reason: e.to_string() }
        } else if e.is_builder() {
            FetchError::Unsupported { url: url.to_string(), reason: e.to_string() }
        } else {
            FetchError::Transport { url: url.to_string(), reason: e.to_string() }
        }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Bytes, FetchError> {
        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::map_error(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }

        response.bytes().await.map_err(|e| Self::map_error(url, timeout, e))
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}
