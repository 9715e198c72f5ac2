//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tokio TcpListener (plain HTTP, HTTPS terminated upstream)
//!     → tls.rs (optional in-process TLS via axum-server + rustls)
//!     → Hand off to HTTP layer
//! ```

pub mod tls;

pub use tls::load_tls_config;
