//! Geolocation subsystem.
//!
//! # Data Flow
//! ```text
//! client identity
//!     → cache.rs (sweep old entries, lazy TTL eviction, hit?)
//!     → aggregator.rs (providers in fixed order, first success wins)
//!     → provider.rs (URL template + payload mapping per provider kind)
//!     → record.rs (normalized GeoRecord, "N/A" for anything missing)
//! ```
//!
//! # Design Decisions
//! - Provider order is configuration, never reordered at runtime
//! - Total failure is a normal outcome: sentinel record, not an error
//! - Failed lookups are not cached

pub mod aggregator;
pub mod cache;
pub mod provider;
pub mod record;

pub use aggregator::GeoAggregator;
pub use cache::GeoCache;
pub use provider::{GeoProvider, ParseError};
pub use record::{GeoRecord, SENTINEL};
