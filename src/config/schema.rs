//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the lookup service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Per-client rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Geolocation cache and provider chain.
    pub geo: GeoConfig,

    /// Proxy/VPN detection provider.
    pub detection: DetectionConfig,

    /// Outbound HTTP settings shared by all providers.
    pub upstream: UpstreamConfig,

    /// On-disk access/error event log.
    pub event_log: EventLogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request deadline in seconds. Must cover the worst-case
    /// sequence of upstream calls.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum admitted requests per client within one window.
    pub max_requests: u64,

    /// Fixed window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 60,
        }
    }
}

/// Geolocation provider flavour. Determines how a payload is mapped onto a
/// [`GeoRecord`](crate::geo::GeoRecord).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    IpApi,
    IpWhois,
    IpInfo,
}

/// One entry of the ordered geolocation provider chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Name used in logs and metrics.
    pub name: String,

    /// Payload flavour.
    pub kind: ProviderKind,

    /// URL template; `{ip}` is replaced by the client address and `{token}`
    /// by `token`.
    pub url: String,

    /// Optional API token.
    #[serde(default)]
    pub token: Option<String>,
}

/// Geolocation cache and provider chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeoConfig {
    /// How long a cached record stays valid, in seconds.
    pub cache_ttl_secs: u64,

    /// Age after which any cache entry is swept regardless of TTL.
    pub eviction_horizon_secs: u64,

    /// Minimum spacing between two sweeps.
    pub sweep_interval_secs: u64,

    /// Providers in fixed priority order.
    pub providers: Vec<ProviderConfig>,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 600,
            eviction_horizon_secs: 3600,
            sweep_interval_secs: 60,
            providers: vec![
                ProviderConfig {
                    name: "ip-api".to_string(),
                    kind: ProviderKind::IpApi,
                    url: "http://ip-api.com/json/{ip}?fields=status,message,country,regionName,city,lat,lon,isp".to_string(),
                    token: None,
                },
                ProviderConfig {
                    name: "ipwhois".to_string(),
                    kind: ProviderKind::IpWhois,
                    url: "https://ipwhois.app/json/{ip}".to_string(),
                    token: None,
                },
                ProviderConfig {
                    name: "ipinfo".to_string(),
                    kind: ProviderKind::IpInfo,
                    url: "https://ipinfo.io/{ip}/json?token={token}".to_string(),
                    token: None,
                },
            ],
        }
    }
}

/// Proxy/VPN detection provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// URL template; `{ip}` is replaced by the client address.
    pub url: String,

    /// API key sent in the `X-Key` header.
    pub api_key: Option<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            url: "http://v2.api.iphub.info/ip/{ip}".to_string(),
            api_key: None,
        }
    }
}

/// Which HTTP stack performs outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Full client (reqwest): HTTP and HTTPS.
    #[default]
    Reqwest,
    /// Minimal hyper client: plain HTTP only.
    Hyper,
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub transport: Transport,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,

    /// User-Agent sent with every call.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Reqwest,
            timeout_secs: 5,
            user_agent: concat!("ipscope/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// On-disk event log.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventLogConfig {
    pub enabled: bool,

    /// Directory holding `access.json` and `error.json`.
    pub directory: String,

    /// Size ceiling in bytes before a partition is rotated.
    pub max_bytes: u64,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: "logs".to_string(),
            max_bytes: 5 * 1024 * 1024, // 5MB
        }
    }
}

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Redirect plain-HTTP requests to HTTPS.
    pub enforce_https: bool,

    /// Path the lookup API is mounted on.
    pub api_path: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enforce_https: true,
            api_path: "/v1/api".to_string(),
        }
    }
}
