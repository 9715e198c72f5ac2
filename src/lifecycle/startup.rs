//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize tracing and metrics
//! - Build the server and bind the listener
//! - Hand control to the server until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{self, ConfigError, ServiceConfig};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::net::load_tls_config;
use crate::observability::{logging, metrics};
use crate::upstream::FetchError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize tracing: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to build upstream client: {0}")]
    Upstream(#[from] FetchError),

    #[error("invalid {what} address {value:?}")]
    Address { what: &'static str, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Load the configuration file, or defaults plus environment overrides
/// when no path is given.
pub fn load(path: Option<&Path>, bind_override: Option<String>) -> Result<ServiceConfig, StartupError> {
    let mut config = match path {
        Some(path) => config::load_config(path)?,
        None => config::default_config()?,
    };
    if let Some(bind) = bind_override {
        config.listener.bind_address = bind;
        config::validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

/// Bring the service up and serve until a shutdown signal arrives.
pub async fn run(config: ServiceConfig) -> Result<(), StartupError> {
    logging::init_tracing(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ipscope starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        providers = config.geo.providers.len(),
        transport = ?config.upstream.transport,
        rate_limit = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = parse_addr("metrics", &config.observability.metrics_address)?;
        metrics::init_metrics(addr);
    }

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    match tls {
        Some(tls) => {
            let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
            let addr = parse_addr("bind", &bind_address)?;
            server.run_tls(addr, rustls, shutdown.subscribe()).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn parse_addr(what: &'static str, value: &str) -> Result<SocketAddr, StartupError> {
    value.parse().map_err(|_| StartupError::Address {
        what,
        value: value.to_string(),
    })
}
