//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + environment credentials
//!     → loader.rs (parse, deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Credentials may come from the environment so they stay out of files

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{default_config, load_config, ConfigError};
pub use schema::DetectionConfig;
pub use schema::EventLogConfig;
pub use schema::GeoConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ProviderConfig;
pub use schema::ProviderKind;
pub use schema::RateLimitConfig;
pub use schema::ServiceConfig;
pub use schema::Transport;
pub use schema::UpstreamConfig;
pub use validation::{validate_config, ValidationError};
