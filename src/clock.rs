//! Time source used by the rate limiter and the geolocation cache.
//!
//! Production code uses [`SystemClock`]; tests drive time explicitly with
//! a test-only `MockClock`.

use std::fmt::Debug;
use std::time::Instant;

#[cfg(test)]
pub use mock::MockClock;

/// Port for obtaining the current instant.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// System clock implementation using `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
