//! Geolocation cache with TTL and an independent eviction horizon.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::clock::{Clock, SystemClock};
use crate::config::GeoConfig;
use crate::geo::record::GeoRecord;
use crate::observability::metrics;
use crate::security::ClientIdentity;

#[derive(Debug, Clone)]
struct CachedGeo {
    record: GeoRecord,
    cached_at: Instant,
}

/// Per-client geolocation records.
///
/// A record is served while younger than `ttl`. Stale records are dropped
/// when their client is looked up again; [`GeoCache::sweep`] drops every
/// record older than `horizon` so entries for clients that never return do
/// not pile up.
#[derive(Debug)]
pub struct GeoCache {
    entries: DashMap<ClientIdentity, CachedGeo>,
    ttl: Duration,
    horizon: Duration,
    sweep_interval: Duration,
    last_sweep: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl GeoCache {
    pub fn new(config: &GeoConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &GeoConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::from_secs(config.cache_ttl_secs),
            horizon: Duration::from_secs(config.eviction_horizon_secs),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
            last_sweep: Mutex::new(None),
            clock,
        }
    }

    /// Fresh record for `identity`. A stale record is removed on the way.
    pub fn get(&self, identity: &ClientIdentity) -> Option<GeoRecord> {
        let now = self.clock.now();
        let ttl = self.ttl;
        let is_stale = |cached: &CachedGeo| now.saturating_duration_since(cached.cached_at) >= ttl;

        if self.entries.remove_if(identity, |_, cached| is_stale(cached)).is_some() {
            tracing::debug!(client = %identity.pseudonym(), "Evicted stale geolocation entry");
            metrics::record_cache_size(self.entries.len());
        }

        let hit = self.entries.get(identity).map(|r| r.value().record.clone());
        metrics::record_cache_lookup(hit.is_some());
        hit
    }

    pub fn insert(&self, identity: ClientIdentity, record: GeoRecord) {
        self.entries.insert(
            identity,
            CachedGeo {
                record,
                cached_at: self.clock.now(),
            },
        );
        metrics::record_cache_size(self.entries.len());
    }

    /// Drop every entry older than the eviction horizon. Returns how many
    /// entries were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let horizon = self.horizon;
        let before = self.entries.len();
        self.entries
            .retain(|_, cached| now.saturating_duration_since(cached.cached_at) < horizon);
        let removed = before.saturating_sub(self.entries.len());

        if let Ok(mut last) = self.last_sweep.lock() {
            *last = Some(now);
        }
        if removed > 0 {
            tracing::debug!(removed, "Swept old geolocation entries");
        }
        metrics::record_cache_size(self.entries.len());
        removed
    }

    /// Sweep unless another sweep is running or one ran within the sweep
    /// interval. Never waits.
    pub fn maybe_sweep(&self) {
        let now = self.clock.now();
        let due = match self.last_sweep.try_lock() {
            Ok(last) => last.map_or(true, |at| now.saturating_duration_since(at) >= self.sweep_interval),
            Err(_) => false,
        };
        if due {
            self.sweep();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
