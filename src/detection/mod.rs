//! Proxy/VPN detection subsystem.

pub mod detector;
pub mod verdict;

pub use detector::{DetectionError, ProxyDetector};
pub use verdict::ProxyVpnVerdict;
