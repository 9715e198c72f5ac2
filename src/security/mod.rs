//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → https.rs (redirect plain HTTP)
//!     → identity.rs (resolve one validated client address)
//!     → rate_limit.rs (per-client fixed-window admission)
//!     → Pass to the lookup handler
//! Outgoing response:
//!     → headers.rs (security headers on everything)
//! ```
//!
//! # Design Decisions
//! - Identity is resolved once and carried in request extensions
//! - Rejections happen before any upstream I/O
//! - Client addresses are only logged as hashes

pub mod headers;
pub mod https;
pub mod identity;
pub mod rate_limit;

pub use identity::ClientIdentity;
pub use rate_limit::{Admission, RateLimiter};
