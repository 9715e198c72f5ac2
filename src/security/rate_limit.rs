//! Per-client fixed-window rate limiting.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;
use crate::security::identity::ClientIdentity;

/// Counter for one client within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitCounter {
    pub window_start: Instant,
    pub count: u64,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    /// Time until the current window ends; zero when allowed.
    pub retry_after: Duration,
}

impl Admission {
    /// `Retry-After` value in whole seconds, never zero for a rejection.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        if self.retry_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs.max(1)
        }
    }
}

/// Fixed-window admission control keyed by client identity.
///
/// Counters live in a sharded `DashMap`; the entry guard makes each
/// load-check-update atomic for one client without a global lock.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u64,
    window: Duration,
    enabled: bool,
    counters: DashMap<ClientIdentity, RateLimitCounter>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            enabled: config.enabled,
            counters: DashMap::new(),
            clock,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check and record one request for `identity`.
    pub fn admit(&self, identity: ClientIdentity) -> Admission {
        if !self.enabled {
            return Admission { allowed: true, retry_after: Duration::ZERO };
        }

        let now = self.clock.now();
        let mut entry = self
            .counters
            .entry(identity)
            .or_insert(RateLimitCounter { window_start: now, count: 0 });
        let counter = entry.value_mut();
        let elapsed = now.saturating_duration_since(counter.window_start);

        if elapsed >= self.window {
            counter.window_start = now;
            counter.count = 1;
        } else if counter.count >= self.max_requests {
            return Admission {
                allowed: false,
                retry_after: self.window - elapsed,
            };
        } else {
            counter.count += 1;
        }

        Admission { allowed: true, retry_after: Duration::ZERO }
    }

    /// Snapshot of a client's counter.
    pub fn counter(&self, identity: &ClientIdentity) -> Option<RateLimitCounter> {
        self.counters.get(identity).map(|r| *r.value())
    }

    /// Drop counters whose window has ended.
    pub fn cleanup(&self) {
        let now = self.clock.now();
        let window = self.window;
        self.counters
            .retain(|_, counter| now.saturating_duration_since(counter.window_start) < window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.counters.len()
    }
}

/// Middleware gate. Runs after identity resolution; a rejection returns 429
/// before any upstream work happens.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(identity) = request.extensions().get::<ClientIdentity>().copied() else {
        return ApiError::IdentityUnresolved.into_response();
    };

    let admission = limiter.admit(identity);
    if admission.allowed {
        next.run(request).await
    } else {
        tracing::warn!(client = %identity.pseudonym(), "Rate limit exceeded");
        metrics::record_rate_limited();
        ApiError::RateLimited {
            retry_after_secs: admission.retry_after_secs(),
        }
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    fn limiter(max_requests: u64, window_secs: u64) -> (RateLimiter, MockClock) {
        let clock = MockClock::default();
        let config = RateLimitConfig { enabled: true, max_requests, window_secs };
        (RateLimiter::with_clock(&config, Arc::new(clock.clone())), clock)
    }

    fn client(last: u8) -> ClientIdentity {
        ClientIdentity::new([192, 0, 2, last].into())
    }

    #[test]
    fn test_rejects_after_ceiling_until_rollover() {
        let (limiter, clock) = limiter(100, 60);
        let id = client(1);

        for _ in 0..100 {
            assert!(limiter.admit(id).allowed);
        }
        for _ in 0..5 {
            let admission = limiter.admit(id);
            assert!(!admission.allowed);
            assert_eq!(admission.retry_after, Duration::from_secs(60));
        }
        assert_eq!(limiter.counter(&id).unwrap().count, 100);

        clock.advance(Duration::from_secs(59));
        assert!(!limiter.admit(id).allowed);
        assert_eq!(limiter.admit(id).retry_after_secs(), 1);

        clock.advance(Duration::from_secs(1));
        assert!(limiter.admit(id).allowed);
        assert_eq!(limiter.counter(&id).unwrap().count, 1);
    }

    #[test]
    fn test_window_is_fixed_not_sliding() {
        let (limiter, clock) = limiter(2, 10);
        let id = client(2);

        assert!(limiter.admit(id).allowed);
        clock.advance(Duration::from_secs(9));
        assert!(limiter.admit(id).allowed);
        assert!(!limiter.admit(id).allowed);

        // Window started at the first request, not the latest one.
        clock.advance(Duration::from_secs(1));
        assert!(limiter.admit(id).allowed);
    }

    #[test]
    fn test_clients_are_independent() {
        let (limiter, _clock) = limiter(1, 60);
        assert!(limiter.admit(client(1)).allowed);
        assert!(!limiter.admit(client(1)).allowed);
        assert!(limiter.admit(client(2)).allowed);
    }

    #[test]
    fn test_disabled_limiter_admits_everything() {
        let config = RateLimitConfig { enabled: false, max_requests: 1, window_secs: 60 };
        let limiter = RateLimiter::new(&config);
        for _ in 0..10 {
            assert!(limiter.admit(client(3)).allowed);
        }
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_cleanup_drops_expired_windows() {
        let (limiter, clock) = limiter(5, 60);
        limiter.admit(client(1));
        clock.advance(Duration::from_secs(30));
        limiter.admit(client(2));
        clock.advance(Duration::from_secs(30));

        limiter.cleanup();
        assert!(limiter.counter(&client(1)).is_none());
        assert!(limiter.counter(&client(2)).is_some());
    }

    #[test]
    fn test_concurrent_admissions_do_not_lose_updates() {
        let (limiter, _clock) = limiter(1000, 60);
        let limiter = Arc::new(limiter);
        let id = client(9);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        limiter.admit(id);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(limiter.counter(&id).unwrap().count, 400);
    }
}
