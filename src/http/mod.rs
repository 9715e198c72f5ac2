//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack, handlers)
//!     → request.rs (request ID)
//!     → [security: HTTPS redirect, identity, rate limit]
//!     → [lookup pipeline for the full formats]
//!     → response.rs (format selection, serializers)
//!     → error.rs (early exits: 400, 429)
//!     → Send to client
//! ```

pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use error::ApiError;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::OutputFormat;
pub use server::HttpServer;
