//! Outbound HTTP to geolocation and detection providers.
//!
//! # Data Flow
//! ```text
//! geo aggregator / proxy detector
//!     → fetcher.rs (Fetcher trait: url + extra headers + timeout)
//!     → reqwest_client.rs (default transport, HTTP + HTTPS)
//!       or hyper_client.rs (minimal plain-HTTP transport)
//!     → raw body bytes or FetchError
//! ```
//!
//! # Design Decisions
//! - Every call has a deadline; a timeout is just another FetchError
//! - No retries here; fallback belongs to the callers
//! - Callers never see which transport served them

pub mod fetcher;
pub mod hyper_client;
#[cfg(test)]
pub mod mock;
pub mod reqwest_client;

pub use fetcher::{build_fetcher, FetchError, Fetcher};
