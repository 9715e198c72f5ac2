//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events, stdout)
//!     → metrics.rs (counters, gauges, histograms)
//!     → event_log.rs (access/error entries on disk, rotated by size)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Operators reading logs/access.json and logs/error.json
//! ```
//!
//! # Design Decisions
//! - Client addresses only reach the event log as one-way hashes
//! - Event log failures never propagate to request handling
//! - Metrics are cheap (atomic increments)

pub mod event_log;
pub mod logging;
pub mod metrics;

pub use event_log::{EventLog, LogEntry, LogKind};
