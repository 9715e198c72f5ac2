//! IPHub-style proxy/VPN detector.
//!
//! # Responsibilities
//! - Call the detection provider once per request, keyed by `X-Key`
//! - Map the `block` code onto a [`ProxyVpnVerdict`]
//! - Absorb every failure into [`ProxyVpnVerdict::DetectionFailed`]
//!
//! # Design Decisions
//! - Stateless: verdicts are never cached
//! - Failures go to the error partition of the event log with the client
//!   pseudonym, never the raw address

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::config::DetectionConfig;
use crate::detection::verdict::ProxyVpnVerdict;
use crate::observability::{metrics, EventLog};
use crate::security::ClientIdentity;
use crate::upstream::{FetchError, Fetcher};

pub const API_KEY_HEADER: &str = "X-Key";

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("detection API key is not configured")]
    MissingCredential,

    #[error("detection request failed: {}", .0.cause())]
    Fetch(#[from] FetchError),

    #[error("unusable detection payload: {0}")]
    Parse(String),
}

pub struct ProxyDetector {
    url_template: String,
    api_key: Option<String>,
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    event_log: Arc<EventLog>,
}

impl ProxyDetector {
    pub fn new(
        config: &DetectionConfig,
        fetcher: Arc<dyn Fetcher>,
        timeout: Duration,
        event_log: Arc<EventLog>,
    ) -> Self {
        Self {
            url_template: config.url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            fetcher,
            timeout,
            event_log,
        }
    }

    /// Classify the client. Never fails.
    pub async fn detect(&self, identity: &ClientIdentity) -> ProxyVpnVerdict {
        let verdict = match self.try_detect(identity).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(client = %identity.pseudonym(), error = %e, "Proxy/VPN detection failed");
                self.event_log.error(format!(
                    "Proxy/VPN detection failed for IP: {}: {}",
                    identity.pseudonym(),
                    e
                ))
                .await;
                ProxyVpnVerdict::DetectionFailed
            }
        };
        metrics::record_detection(verdict.as_str());
        verdict
    }

    pub async fn try_detect(&self, identity: &ClientIdentity) -> Result<ProxyVpnVerdict, DetectionError> {
        let key = self.api_key.as_deref().ok_or(DetectionError::MissingCredential)?;
        let url = self.url_template.replace("{ip}", &identity.to_string());

        let body = self
            .fetcher
            .fetch(&url, &[(API_KEY_HEADER, key)], self.timeout)
            .await?;

        parse_block_code(&body).map(ProxyVpnVerdict::from_block_code)
    }
}

fn parse_block_code(body: &[u8]) -> Result<i64, DetectionError> {
    let json: Value = serde_json::from_slice(body).map_err(|e| DetectionError::Parse(e.to_string()))?;
    let block = json
        .get("block")
        .ok_or_else(|| DetectionError::Parse("missing `block` field".to_string()))?;
    block_as_integer(block)
        .ok_or_else(|| DetectionError::Parse(format!("`block` is not an integer: {}", block)))
}

/// `block` compares loosely: `1`, `1.0` and `"1"` are the same code.
fn block_as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64).then_some(v as i64)
}
