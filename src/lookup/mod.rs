//! Result composition.
//!
//! # Data Flow
//! ```text
//! ClientIdentity
//!     → GeoAggregator::resolve (cache, then provider chain)
//!     → ProxyDetector::detect (always a fresh call)
//!     → compose → ResultRecord → serializers
//! ```

use std::sync::Arc;

use crate::detection::{ProxyDetector, ProxyVpnVerdict};
use crate::geo::{GeoAggregator, GeoRecord};
use crate::security::ClientIdentity;

/// Everything the `full` reports show. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub identity: ClientIdentity,
    pub geo: GeoRecord,
    pub verdict: ProxyVpnVerdict,
}

pub fn compose(identity: ClientIdentity, geo: GeoRecord, verdict: ProxyVpnVerdict) -> ResultRecord {
    ResultRecord { identity, geo, verdict }
}

/// Runs the full pipeline for one identity.
pub struct LookupService {
    aggregator: Arc<GeoAggregator>,
    detector: Arc<ProxyDetector>,
}

impl LookupService {
    pub fn new(aggregator: Arc<GeoAggregator>, detector: Arc<ProxyDetector>) -> Self {
        Self { aggregator, detector }
    }

    pub fn aggregator(&self) -> &Arc<GeoAggregator> {
        &self.aggregator
    }

    pub async fn lookup(&self, identity: ClientIdentity) -> ResultRecord {
        let geo = self.aggregator.resolve(&identity).await;
        let verdict = self.detector.detect(&identity).await;
        compose(identity, geo, verdict)
    }
}
