//! IP geolocation and proxy/VPN detection service.

pub mod clock;
pub mod config;
pub mod detection;
pub mod geo;
pub mod http;
pub mod lifecycle;
pub mod lookup;
pub mod net;
pub mod observability;
pub mod security;
pub mod upstream;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
