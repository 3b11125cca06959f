//! Per-client request throttling
//!
//! One token bucket per client IP, refilled continuously at the configured
//! rate. Buckets idle longer than `expires_in` are swept out, but never before
//! they would have refilled to full, so eviction cannot mint tokens.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tracing::warn;

use contracts::RateLimitConfig;

use crate::error::GatewayError;

/// Bucket key used when the peer address is unavailable
pub const UNKNOWN_CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(burst: f64, now: Instant) -> Self {
        Self {
            tokens: burst,
            last_refill: now,
        }
    }

    fn try_acquire(&mut self, now: Instant, rate: f64, burst: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(burst);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token-bucket limiter keyed by client IP
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<IpAddr, TokenBucket>,
    rate: f64,
    burst: f64,
    /// idle time after which a bucket is evicted
    idle_ttl: Duration,
    started: Instant,
    /// millis since `started` of the last sweep
    last_sweep_ms: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let rate = f64::from(config.max_requests_per_second);
        let burst = f64::from(config.effective_burst());
        // A zero rate never refills; such buckets are never evicted either.
        let refill_to_full =
            Duration::try_from_secs_f64((burst / rate).ceil()).unwrap_or(Duration::MAX);

        Self {
            buckets: DashMap::new(),
            rate,
            burst,
            idle_ttl: Duration::from_secs(config.expires_in_secs).max(refill_to_full),
            started: Instant::now(),
            last_sweep_ms: AtomicU64::new(0),
        }
    }

    /// Take one token for `client`; false when its bucket is empty.
    pub fn check(&self, client: IpAddr) -> bool {
        self.check_at(client, Instant::now())
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> bool {
        self.sweep_expired(now);

        let mut bucket = self
            .buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::full(self.burst, now));
        bucket.try_acquire(now, self.rate, self.burst)
    }

    fn sweep_expired(&self, now: Instant) {
        let now_ms = now.saturating_duration_since(self.started).as_millis() as u64;
        let ttl_ms = u64::try_from(self.idle_ttl.as_millis()).unwrap_or(u64::MAX);
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        if now_ms.saturating_sub(last) < ttl_ms {
            return;
        }
        // Only the caller that wins the exchange sweeps.
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let ttl = self.idle_ttl;
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < ttl);
    }
}

/// Middleware rejecting requests from clients over their budget with 429.
pub async fn throttle(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(UNKNOWN_CLIENT);

    if !limiter.check(client) {
        let route = route_label(request.uri().path());
        observability::record_request_throttled(route);
        warn!(client = %client, route, "Request throttled");
        return GatewayError::RateLimited.into_response();
    }

    next.run(request).await
}

fn route_label(path: &str) -> &'static str {
    if path.starts_with("/wh/") {
        "ingest"
    } else if path.starts_with("/messages/") {
        "drain"
    } else {
        "other"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(rate: u32, burst: Option<u32>, expires_in_secs: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_requests_per_second: rate,
            burst,
            expires_in_secs,
        })
    }

    #[test]
    fn test_burst_then_reject() {
        let limiter = limiter(2, None, 180);
        let client: IpAddr = "10.0.0.1".parse().unwrap();
        let now = Instant::now();

        assert!(limiter.check_at(client, now));
        assert!(limiter.check_at(client, now));
        assert!(!limiter.check_at(client, now));
    }

    #[test]
    fn test_refill_over_time() {
        let limiter = limiter(2, None, 180);
        let client: IpAddr = "10.0.0.1".parse().unwrap();
        let now = Instant::now();

        assert!(limiter.check_at(client, now));
        assert!(limiter.check_at(client, now));
        assert!(!limiter.check_at(client, now));

        // 2 tokens/s -> one token after 500ms
        let later = now + Duration::from_millis(500);
        assert!(limiter.check_at(client, later));
        assert!(!limiter.check_at(client, later));
    }

    #[test]
    fn test_clients_have_separate_buckets() {
        let limiter = limiter(1, None, 180);
        let now = Instant::now();

        assert!(limiter.check_at("10.0.0.1".parse().unwrap(), now));
        assert!(!limiter.check_at("10.0.0.1".parse().unwrap(), now));
        assert!(limiter.check_at("10.0.0.2".parse().unwrap(), now));
    }

    #[test]
    fn test_idle_buckets_are_swept() {
        let limiter = limiter(1, None, 1);
        let now = Instant::now();

        limiter.check_at("10.0.0.1".parse().unwrap(), now);
        assert_eq!(limiter.tracked_clients(), 1);

        let later = now + Duration::from_secs(5);
        limiter.check_at("10.0.0.2".parse().unwrap(), later);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_zero_expiry_still_throttles() {
        let limiter = limiter(1, None, 0);
        let client: IpAddr = "10.0.0.1".parse().unwrap();
        let now = Instant::now();

        let allowed = (0..100).filter(|_| limiter.check_at(client, now)).count();
        assert_eq!(allowed, 1);
    }

    #[test]
    fn test_short_expiry_does_not_refill_large_burst() {
        let limiter = limiter(1, Some(10), 1);
        let client: IpAddr = "10.0.0.1".parse().unwrap();
        let now = Instant::now();

        let allowed = (0..20).filter(|_| limiter.check_at(client, now)).count();
        assert_eq!(allowed, 10);

        // Past the configured expiry but short of a full refill: only the
        // 2 tokens earned in 2s are available.
        let later = now + Duration::from_secs(2);
        let allowed = (0..20).filter(|_| limiter.check_at(client, later)).count();
        assert_eq!(allowed, 2);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_route_label() {
        assert_eq!(route_label("/wh/agent1"), "ingest");
        assert_eq!(route_label("/messages/agent1"), "drain");
        assert_eq!(route_label("/"), "other");
    }
}
