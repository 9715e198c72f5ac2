//! Cache-first geolocation over a fixed-priority provider chain.

use std::sync::Arc;
use std::time::Duration;

use crate::config::GeoConfig;
use crate::geo::cache::GeoCache;
use crate::geo::provider::GeoProvider;
use crate::geo::record::GeoRecord;
use crate::observability::{metrics, EventLog};
use crate::security::ClientIdentity;
use crate::upstream::Fetcher;

/// Resolves geolocation for a client. Never fails: when every provider is
/// down the caller gets [`GeoRecord::unavailable`].
pub struct GeoAggregator {
    providers: Vec<GeoProvider>,
    cache: GeoCache,
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    event_log: Arc<EventLog>,
}

impl GeoAggregator {
    pub fn new(
        config: &GeoConfig,
        cache: GeoCache,
        fetcher: Arc<dyn Fetcher>,
        timeout: Duration,
        event_log: Arc<EventLog>,
    ) -> Self {
        Self {
            providers: config.providers.iter().map(GeoProvider::from_config).collect(),
            cache,
            fetcher,
            timeout,
            event_log,
        }
    }

    pub fn cache(&self) -> &GeoCache {
        &self.cache
    }

    pub async fn resolve(&self, identity: &ClientIdentity) -> GeoRecord {
        self.cache.maybe_sweep();

        if let Some(record) = self.cache.get(identity) {
            tracing::debug!(client = %identity.pseudonym(), "Geolocation cache hit");
            return record;
        }

        for provider in &self.providers {
            if let Some(record) = self.query(provider, identity).await {
                self.cache.insert(*identity, record.clone());
                return record;
            }
        }

        tracing::warn!(client = %identity.pseudonym(), "All geolocation providers failed");
        self.event_log
            .error(format!("All geolocation APIs failed for IP: {}", identity.pseudonym()))
            .await;
        GeoRecord::unavailable()
    }

    /// One provider attempt. Failures are logged and yield `None`.
    async fn query(&self, provider: &GeoProvider, identity: &ClientIdentity) -> Option<GeoRecord> {
        let Some(url) = provider.url_for(identity) else {
            tracing::debug!(provider = %provider.name, "Skipping provider without token");
            metrics::record_provider_result(&provider.name, "skipped");
            return None;
        };

        let body = match self.fetcher.fetch(&url, &[], self.timeout).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(provider = %provider.name, error = %e.cause(), "Geolocation fetch failed");
                metrics::record_provider_result(&provider.name, "fetch_error");
                self.event_log.error(format!(
                    "Geolocation provider {} failed for IP: {}: {}",
                    provider.name,
                    identity.pseudonym(),
                    e.cause()
                ))
                .await;
                return None;
            }
        };

        match provider.parse(&body) {
            Ok(record) => {
                tracing::debug!(provider = %provider.name, "Geolocation resolved");
                metrics::record_provider_result(&provider.name, "success");
                Some(record)
            }
            Err(e) => {
                tracing::warn!(provider = %provider.name, error = %e, "Geolocation payload rejected");
                metrics::record_provider_result(&provider.name, "parse_error");
                self.event_log.error(format!(
                    "Geolocation provider {} returned unusable data for IP: {}: {}",
                    provider.name,
                    identity.pseudonym(),
                    e
                ))
                .await;
                None
            }
        }
    }
}
