//! The ledger read interface the verifier depends on.

use std::sync::Arc;

use async_trait::async_trait;
use solpick::Retryable;

use super::{Address, ParsedTransaction, SignatureInfo};

/// Boxed transport error carried by [`ProviderError::Http`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while talking to a Solana RPC node.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The request could not be sent or the response body could not be read.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// What was being attempted.
        context: &'static str,
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },
    /// The node answered with a non-success HTTP status.
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// What was being attempted.
        context: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The node is throttling this client.
    #[error("Rate limited by RPC node: {context}")]
    RateLimited {
        /// What was being attempted.
        context: &'static str,
    },
    /// The node returned a JSON-RPC error object.
    #[error("RPC error {code}: {context}: {message}")]
    Rpc {
        /// What was being attempted.
        context: &'static str,
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },
    /// The response body is not the expected JSON.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// What was being attempted.
        context: &'static str,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// A JSON-RPC response carried neither `result` nor `error`.
    #[error("RPC response has no result: {context}")]
    MissingResult {
        /// What was being attempted.
        context: &'static str,
    },
}

impl ProviderError {
    /// Whether the node rejected the call because of request volume.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::HttpStatus { status: 429, .. }
                | Self::Rpc { code: 429, .. }
        )
    }
}

impl Retryable for ProviderError {
    fn is_rate_limited(&self) -> bool {
        Self::is_rate_limited(self)
    }
}

/// Read access to the ledger.
///
/// [`crate::chain::rpc::RpcClient`] talks to a real node; tests substitute an
/// in-memory ledger.
#[async_trait]
pub trait LedgerHistory: Send + Sync {
    /// Up to `limit` signatures of transactions touching `address`, newest first.
    async fn list_recent_signatures(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ProviderError>;

    /// The parsed transaction for `signature`, or `None` if the node does not
    /// have it (yet).
    async fn fetch_parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, ProviderError>;
}

#[async_trait]
impl<T: LedgerHistory + ?Sized> LedgerHistory for Arc<T> {
    async fn list_recent_signatures(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ProviderError> {
        (**self).list_recent_signatures(address, limit).await
    }

    async fn fetch_parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, ProviderError> {
        (**self).fetch_parsed_transaction(signature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_classification() {
        assert!(ProviderError::RateLimited { context: "x" }.is_rate_limited());
        assert!(
            ProviderError::HttpStatus {
                context: "x",
                status: 429,
                body: String::new(),
            }
            .is_rate_limited()
        );
        assert!(
            !ProviderError::HttpStatus {
                context: "x",
                status: 500,
                body: String::new(),
            }
            .is_rate_limited()
        );
        assert!(
            !ProviderError::Rpc {
                context: "x",
                code: -32602,
                message: "Invalid param".to_owned(),
            }
            .is_rate_limited()
        );
    }
}
