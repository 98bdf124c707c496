//! Unix timestamps for payment request bookkeeping.
//!
//! [`UnixTimestamp`] records when a payment request was created or marked paid,
//! and answers the one question expiry needs: is a record older than its TTL?

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::{Duration, SystemTime};

/// Seconds since the Unix epoch (1970-01-01T00:00:00Z).
///
/// Serialized as a plain JSON integer.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTimestamp(u64);

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<Duration> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0.saturating_add(rhs.as_secs()))
    }
}

impl UnixTimestamp {
    /// Creates a new [`UnixTimestamp`] from a raw seconds value.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time as a [`UnixTimestamp`].
    ///
    /// A clock set before the epoch reads as the epoch itself.
    #[must_use]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self(secs)
    }

    /// Returns the timestamp as raw seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Time elapsed between `self` and a later instant `now`; zero if `now` is earlier.
    #[must_use]
    pub const fn elapsed_at(&self, now: Self) -> Duration {
        Duration::from_secs(now.0.saturating_sub(self.0))
    }

    /// Whether at least `ttl` has passed between `self` and `now`.
    #[must_use]
    pub const fn is_expired_at(&self, now: Self, ttl: Duration) -> bool {
        self.elapsed_at(now).as_secs() >= ttl.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let created = UnixTimestamp::from_secs(1_000);
        let ttl = Duration::from_secs(1_800);
        assert!(!created.is_expired_at(UnixTimestamp::from_secs(2_799), ttl));
        assert!(created.is_expired_at(UnixTimestamp::from_secs(2_800), ttl));
    }

    #[test]
    fn test_elapsed_saturates() {
        let created = UnixTimestamp::from_secs(500);
        assert_eq!(
            created.elapsed_at(UnixTimestamp::from_secs(100)),
            Duration::ZERO
        );
        assert_eq!(created + Duration::from_secs(10), UnixTimestamp::from_secs(510));
    }

    #[test]
    fn test_serializes_as_integer() {
        let ts = UnixTimestamp::from_secs(1_699_999_999);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "1699999999");
        let back: UnixTimestamp = serde_json::from_str("1699999999").unwrap();
        assert_eq!(back, ts);
    }
}
