//! Scripted fetcher for tests.
//!
//! Responses are matched by URL substring in registration order. Every call
//! is recorded so tests can assert how often (and with which headers) a
//! provider was reached.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::upstream::fetcher::{FetchError, Fetcher};

#[derive(Debug, Clone)]
enum Scripted {
    Body(String),
    Fail,
}

/// A recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub struct MockFetcher {
    routes: Mutex<Vec<(String, Scripted)>>,
    calls: Mutex<Vec<FetchCall>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer URLs containing `pattern` with `body`.
    pub fn respond(self, pattern: &str, body: impl Into<String>) -> Self {
        self.push(pattern, Scripted::Body(body.into()));
        self
    }

    /// Fail URLs containing `pattern` with a connection error.
    pub fn fail(self, pattern: &str) -> Self {
        self.push(pattern, Scripted::Fail);
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().expect("mock fetcher mutex poisoned").clone()
    }

    pub fn calls_to(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.url.contains(pattern)).count()
    }

    fn push(&self, pattern: &str, scripted: Scripted) {
        self.routes
            .lock()
            .expect("mock fetcher mutex poisoned")
            .push((pattern.to_string(), scripted));
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        _timeout: Duration,
    ) -> Result<Bytes, FetchError> {
        self.calls.lock().expect("mock fetcher mutex poisoned").push(FetchCall {
            url: url.to_string(),
            headers: headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        });

        let scripted = self
            .routes
            .lock()
            .expect("mock fetcher mutex poisoned")
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, s)| s.clone());

        match scripted {
            Some(Scripted::Body(body)) => Ok(Bytes::from(body)),
            Some(Scripted::Fail) | None => Err(FetchError::Connect {
                url: url.to_string(),
                reason: "scripted failure".to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
