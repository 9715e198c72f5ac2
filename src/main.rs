//! ipscope: tells callers their IP address, where it geolocates, and
//! whether it looks like a proxy or VPN.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ HTTPS redirect ─▶ /health ─────────────────────────────▶ {"status":"ok"}
//!                          │
//!                          ▼
//!                   identity resolver ─▶ rate limiter ─▶ format?
//!                                                          │
//!                        text/json/jsonp/xml/csv/html ◀────┤
//!                                                          │ full / full-json
//!                                                          ▼
//!                                       geo cache ─▶ provider chain ─▶ detector
//!                                                          │
//!                                                          ▼
//!                                                  ResultRecord ─▶ serializer
//!
//!     Cross-cutting: config · tracing · metrics · event log · lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;

use ipscope::lifecycle::startup;

#[derive(Parser, Debug)]
#[command(name = "ipscope", version, about = "IP geolocation and proxy/VPN detection service")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "IPSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address (e.g. 0.0.0.0:8080).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = startup::load(cli.config.as_deref(), cli.bind)?;
    startup::run(config).await?;

    Ok(())
}
