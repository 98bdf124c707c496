//! Retry with exponential backoff for rate-limited operations.
//!
//! Public RPC endpoints answer bursts with HTTP 429. [`with_retry`] re-invokes an
//! operation while its error reports [`Retryable::is_rate_limited`], doubling the
//! delay after each attempt. Every other error is returned immediately.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Classifies errors that are worth retrying after a pause.
pub trait Retryable {
    /// Returns `true` if the error signals a transient rate limit.
    fn is_rate_limited(&self) -> bool;
}

/// Backoff parameters for [`with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    /// Default: 5
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubled for each subsequent one.
    /// Default: 1 second
    #[serde(default = "default_initial_delay", with = "millis")]
    pub initial_delay: Duration,
}

const fn default_max_retries() -> u32 {
    5
}

const fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay: default_initial_delay(),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given retry budget and initial delay.
    #[must_use]
    pub const fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Returns a copy of this policy with a different retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Runs `operation`, retrying rate-limited failures with exponential backoff.
///
/// # Errors
///
/// Returns the operation's error if it is not rate limited, or the last
/// rate-limit error once `policy.max_retries` retries are exhausted.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    let mut delay = policy.initial_delay;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_rate_limited() && attempt < policy.max_retries => {
                attempt += 1;
                #[cfg(feature = "telemetry")]
                tracing::warn!(
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "Rate limited, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            Err(err) => return Err(err),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
