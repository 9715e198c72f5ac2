//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the lookup pipeline (fetcher, geo aggregator, detector, event log)
//! - Create the Axum router: API path, `/health`, fallback
//! - Wire up middleware (HTTPS redirect, security headers, request ID,
//!   tracing, timeout, identity, rate limiting)
//! - Serve over plain TCP or TLS with graceful shutdown
//! - Run background maintenance (counter cleanup, cache sweep)
//!
//! # Layer order (outermost first)
//! ```text
//! TraceLayer → SetRequestId → PropagateRequestId → security headers
//!     → HTTPS redirect → timeout → routes
//!                                  └ API path: identity → rate limit → handler
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::detection::ProxyDetector;
use crate::geo::{GeoAggregator, GeoCache};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::{render_full, render_identity, OutputFormat};
use crate::lookup::LookupService;
use crate::observability::{metrics, EventLog};
use crate::security::headers::with_security_headers;
use crate::security::https::{https_redirect_middleware, HttpsPolicy};
use crate::security::identity::identity_middleware;
use crate::security::rate_limit::rate_limit_middleware;
use crate::security::{ClientIdentity, RateLimiter};
use crate::upstream::{build_fetcher, FetchError, Fetcher};

/// How long in-flight TLS connections may drain after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<LookupService>,
    pub event_log: Arc<EventLog>,
}

/// HTTP server for the lookup service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    limiter: Arc<RateLimiter>,
    lookup: Arc<LookupService>,
}

impl HttpServer {
    /// Create a server using the transport named in the configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, FetchError> {
        let fetcher = build_fetcher(&config.upstream)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Create a server around an existing fetcher.
    pub fn with_fetcher(config: ServiceConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let event_log = Arc::new(EventLog::new(&config.event_log));
        let timeout = Duration::from_secs(config.upstream.timeout_secs);

        let aggregator = Arc::new(GeoAggregator::new(
            &config.geo,
            GeoCache::new(&config.geo),
            fetcher.clone(),
            timeout,
            event_log.clone(),
        ));
        let detector = Arc::new(ProxyDetector::new(
            &config.detection,
            fetcher,
            timeout,
            event_log.clone(),
        ));
        let lookup = Arc::new(LookupService::new(aggregator, detector));
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        let state = AppState {
            lookup: lookup.clone(),
            event_log,
        };
        let router = Self::build_router(&config, state, limiter.clone());

        Self {
            router,
            config,
            limiter,
            lookup,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState, limiter: Arc<RateLimiter>) -> Router {
        let https = HttpsPolicy {
            enforce: config.security.enforce_https,
            tls_listener: config.listener.tls.is_some(),
        };

        // route_layer: the last one added runs first.
        let api = Router::new()
            .route(&config.security.api_path, get(api_handler))
            .route_layer(from_fn_with_state(limiter, rate_limit_middleware))
            .route_layer(from_fn(identity_middleware));

        let router = Router::new()
            .route("/health", get(health_handler))
            .merge(api)
            .fallback(not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(from_fn_with_state(https, https_redirect_middleware));

        with_security_headers(router)
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router. Requests need `ConnectInfo<SocketAddr>` in
    /// their extensions or a forwarding header to resolve a client.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, api_path = %self.config.security.api_path, "HTTP server starting");

        self.spawn_maintenance(&shutdown);

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS terminated in-process.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, api_path = %self.config.security.api_path, "HTTPS server starting");

        self.spawn_maintenance(&shutdown);

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received, draining connections");
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Periodic counter cleanup and cache sweep, stopped by `shutdown`.
    fn spawn_maintenance(&self, shutdown: &broadcast::Receiver<()>) {
        let limiter = self.limiter.clone();
        let every = limiter.window().max(Duration::from_secs(1));
        let mut stop = shutdown.resubscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        limiter.cleanup();
                        tracing::trace!(clients = limiter.tracked_clients(), "Rate limit counters cleaned up");
                    }
                    _ = stop.recv() => break,
                }
            }
        });

        let lookup = self.lookup.clone();
        let every = Duration::from_secs(self.config.geo.sweep_interval_secs).max(Duration::from_secs(1));
        let mut stop = shutdown.resubscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        lookup.aggregator().cache().sweep();
                    }
                    _ = stop.recv() => break,
                }
            }
        });
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiQuery {
    pub format: Option<String>,
    pub callback: Option<String>,
}

async fn api_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ClientIdentity>,
    Query(query): Query<ApiQuery>,
) -> Response {
    let start = Instant::now();
    let format = OutputFormat::parse(query.format.as_deref());

    tracing::debug!(client = %identity.pseudonym(), format = format.as_str(), "Serving lookup");
    state
        .event_log
        .access(format!("IP: {} - Format: {}", identity.pseudonym(), format.as_str()))
        .await;

    let response = if format.needs_lookup() {
        let result = state.lookup.lookup(identity).await;
        render_full(format, &result)
    } else {
        match render_identity(format, &identity, query.callback.as_deref()) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(client = %identity.pseudonym(), error = %e, "Rejected JSONP request");
                state.event_log.error(format!(
                    "Invalid JSONP callback from IP: {}",
                    identity.pseudonym()
                ))
                .await;
                e.into_response()
            }
        }
    };

    metrics::record_request(format.as_str(), response.status().as_u16(), start);
    response
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
