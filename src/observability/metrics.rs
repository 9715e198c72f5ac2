//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ipscope_requests_total` (counter): responses by format and status
//! - `ipscope_request_duration_seconds` (histogram): handler latency
//! - `ipscope_rate_limited_total` (counter): rejected admissions
//! - `ipscope_geo_cache_total` (counter): cache hits and misses
//! - `ipscope_geo_cache_entries` (gauge): cached records
//! - `ipscope_provider_requests_total` (counter): provider calls by outcome
//! - `ipscope_detection_total` (counter): proxy/VPN verdicts
//!
//! Without an installed recorder every call is a no-op, so tests need no
//! setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(format: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "ipscope_requests_total",
        "format" => format,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("ipscope_request_duration_seconds", "format" => format)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    ::metrics::counter!("ipscope_rate_limited_total").increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    ::metrics::counter!("ipscope_geo_cache_total", "result" => result).increment(1);
}

pub fn record_cache_size(entries: usize) {
    ::metrics::gauge!("ipscope_geo_cache_entries").set(entries as f64);
}

pub fn record_provider_result(provider: &str, outcome: &'static str) {
    ::metrics::counter!(
        "ipscope_provider_requests_total",
        "provider" => provider.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_detection(verdict: &'static str) {
    ::metrics::counter!("ipscope_detection_total", "verdict" => verdict).increment(1);
}
