//! Configuration for the reference verifier.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Most signatures `getSignaturesForAddress` returns in one call.
pub const MAX_SIGNATURE_LIMIT: usize = 1_000;

/// Tuning knobs for [`crate::pay::ReferenceVerifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierConfig {
    /// How many of the recipient's most recent signatures to inspect.
    /// Clamped to `1..=MAX_SIGNATURE_LIMIT` when used.
    /// Default: 10
    #[serde(default = "default_signature_limit")]
    pub signature_limit: usize,

    /// How many transactions to fetch at once. Results are still inspected in
    /// recency order, so the newest match wins regardless of this value.
    /// Default: 1
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Overall deadline for one verification, in milliseconds.
    /// Default: none
    #[serde(default, rename = "timeoutMs", with = "opt_millis")]
    pub timeout: Option<Duration>,
}

const fn default_signature_limit() -> usize {
    10
}

const fn default_fetch_concurrency() -> usize {
    1
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            signature_limit: default_signature_limit(),
            fetch_concurrency: default_fetch_concurrency(),
            timeout: None,
        }
    }
}

impl VerifierConfig {
    /// Sets the number of signatures to inspect.
    #[must_use]
    pub const fn with_signature_limit(mut self, limit: usize) -> Self {
        self.signature_limit = limit;
        self
    }

    /// Sets the number of concurrent transaction fetches.
    #[must_use]
    pub const fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency;
        self
    }

    /// The signature limit actually sent to the node.
    #[must_use]
    pub const fn effective_signature_limit(&self) -> usize {
        if self.signature_limit == 0 {
            1
        } else if self.signature_limit > MAX_SIGNATURE_LIMIT {
            MAX_SIGNATURE_LIMIT
        } else {
            self.signature_limit
        }
    }

    /// Sets the overall deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

mod opt_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => {
                serializer.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: VerifierConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, VerifierConfig::default());
        assert_eq!(config.signature_limit, 10);
        assert_eq!(config.fetch_concurrency, 1);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_camel_case_fields() {
        let config: VerifierConfig = serde_json::from_str(
            r#"{"signatureLimit": 25, "fetchConcurrency": 4, "timeoutMs": 1500}"#,
        )
        .unwrap();
        assert_eq!(config.signature_limit, 25);
        assert_eq!(config.fetch_concurrency, 4);
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_signature_limit_clamped_to_rpc_range() {
        assert_eq!(VerifierConfig::default().effective_signature_limit(), 10);
        assert_eq!(
            VerifierConfig::default()
                .with_signature_limit(0)
                .effective_signature_limit(),
            1
        );
        assert_eq!(
            VerifierConfig::default()
                .with_signature_limit(5_000)
                .effective_signature_limit(),
            MAX_SIGNATURE_LIMIT
        );
    }
}
