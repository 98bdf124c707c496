//! Error types for payment verification and transaction building.

use solpick::{AmountError, Retryable};
use std::time::Duration;

use crate::chain::{InvalidAddress, ProviderError};

/// Why a verification attempt produced no answer.
///
/// "Nothing matched" is not an error; it is `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// A reference or recipient did not decode.
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddress),
    /// The amount has no lamport representation.
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
    /// The ledger could not be read.
    #[error("Ledger provider failed: {0}")]
    Provider(#[from] ProviderError),
    /// The caller cancelled the attempt.
    #[error("Verification cancelled")]
    Cancelled,
    /// The attempt ran past its deadline.
    #[error("Verification timed out after {0:?}")]
    TimedOut(Duration),
}

impl Retryable for VerifyError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_rate_limited())
    }
}

/// Why an unsigned transfer could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The payer or recipient did not decode.
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddress),
    /// The amount has no lamport representation.
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
    /// The latest blockhash could not be fetched.
    #[error("Ledger provider failed: {0}")]
    Provider(#[from] ProviderError),
    /// The node returned a blockhash that is not base58 32 bytes.
    #[error("Invalid blockhash {0:?}")]
    InvalidBlockhash(String),
    /// The transaction could not be encoded.
    #[error("Can not serialize transaction: {0}")]
    Serialize(String),
}

impl Retryable for TransactionError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_rate_limited())
    }
}
