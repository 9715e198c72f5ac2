//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows and timeouts > 0, addresses parse)
//! - Check provider templates carry the `{ip}` placeholder and expand to
//!   valid http(s) URLs
//! - Check the request deadline covers the worst-case upstream chain
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
        }
    }

    if config.geo.cache_ttl_secs == 0 {
        errors.push(ValidationError::new("geo.cache_ttl_secs", "must be greater than 0"));
    }
    if config.geo.eviction_horizon_secs < config.geo.cache_ttl_secs {
        errors.push(ValidationError::new(
            "geo.eviction_horizon_secs",
            "must not be shorter than geo.cache_ttl_secs",
        ));
    }
    if config.geo.providers.is_empty() {
        errors.push(ValidationError::new("geo.providers", "at least one provider is required"));
    }
    for (i, provider) in config.geo.providers.iter().enumerate() {
        check_url_template(&format!("geo.providers[{}].url", i), &provider.url, &mut errors);
    }

    check_url_template("detection.url", &config.detection.url, &mut errors);

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.timeout_secs", "must be greater than 0"));
    }
    let worst_case = (config.geo.providers.len() as u64 + 1).saturating_mul(config.upstream.timeout_secs);
    if config.timeouts.request_secs > 0 && config.timeouts.request_secs < worst_case {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must cover every provider plus detection ({} x {}s = {}s)",
                config.geo.providers.len() + 1,
                config.upstream.timeout_secs,
                worst_case
            ),
        ));
    }
    if config.upstream.user_agent.trim().is_empty() {
        errors.push(ValidationError::new("upstream.user_agent", "must not be empty"));
    }

    if config.event_log.enabled && config.event_log.max_bytes == 0 {
        errors.push(ValidationError::new("event_log.max_bytes", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    let api_path = &config.security.api_path;
    if !api_path.starts_with('/')
        || api_path == "/health"
        || api_path.contains(|c| matches!(c, '{' | '}' | '*'))
    {
        errors.push(ValidationError::new(
            "security.api_path",
            "must be a literal path starting with '/' and differ from /health",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A template must name `{ip}` and expand to an http(s) URL.
fn check_url_template(field: &str, template: &str, errors: &mut Vec<ValidationError>) {
    if !template.contains("{ip}") {
        errors.push(ValidationError::new(field, "missing {ip} placeholder"));
        return;
    }

    let expanded = template.replace("{ip}", "192.0.2.1").replace("{token}", "token");
    match Url::parse(&expanded) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}
