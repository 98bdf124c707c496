//! Per-client-IP request rate limiting.
//!
//! Each IP gets a bucket of `max` requests that refills evenly over `window`.
//! Requests beyond that are answered with 429 before reaching a handler.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Rate limit settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in milliseconds (default: 15 minutes).
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Requests allowed per IP per window (default: 100).
    #[serde(default = "default_max")]
    pub max: u32,
}

const fn default_window_ms() -> u64 {
    900_000
}

const fn default_max() -> u32 {
    100
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max: default_max(),
        }
    }
}

/// Keyed limiter shared by all requests.
pub struct IpRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl std::fmt::Debug for IpRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpRateLimiter").finish_non_exhaustive()
    }
}

impl IpRateLimiter {
    /// Builds a limiter from `config`. A zero `max` is treated as one.
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        let max = NonZeroU32::new(config.max).unwrap_or(NonZeroU32::MIN);
        let period = Duration::from_millis(config.window_ms.max(1)) / max.get();
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(max))
            .allow_burst(max);
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// Whether `ip` may make another request now.
    #[must_use]
    pub fn check(&self, ip: IpAddr) -> bool {
        self.limiter.check_key(&ip).is_ok()
    }

    /// Drops state for clients whose buckets are full again.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }
}

/// Middleware rejecting requests from IPs over their budget.
///
/// The client address comes from [`ConnectInfo`]; requests without it share
/// the unspecified address's budget.
pub async fn limit_by_ip(
    State(limiter): State<Arc<IpRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |info| info.0.ip());
    if limiter.check(ip) {
        next.run(request).await
    } else {
        tracing::warn!(%ip, "Rate limit exceeded");
        ApiError::RateLimited.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_per_ip() {
        let limiter = IpRateLimiter::new(&RateLimitConfig {
            window_ms: 60_000,
            max: 2,
        });
        let a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert!(limiter.check(a));
        assert!(limiter.check(a));
        assert!(!limiter.check(a));
        assert!(limiter.check(b));
    }

    #[test]
    fn test_zero_max_still_admits_one() {
        let limiter = IpRateLimiter::new(&RateLimitConfig {
            window_ms: 60_000,
            max: 0,
        });
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(limiter.check(ip));
        assert!(!limiter.check(ip));
    }

    #[test]
    fn test_config_defaults() {
        let config: RateLimitConfig = toml::from_str("").unwrap();
        assert_eq!(config, RateLimitConfig::default());
        assert_eq!(config.window_ms, 900_000);
        assert_eq!(config.max, 100);
    }
}
