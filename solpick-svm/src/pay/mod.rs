//! Payment requests on Solana.
//!
//! - [`verify`] - Confirms a payment by scanning the recipient's history for its reference key
//! - [`link`] - Wallet and hosted-page URLs, reference generation
//! - [`transaction`] - Unsigned SOL transfers for wallets to sign (feature `rpc`)

pub mod config;
pub mod error;
pub mod link;
#[cfg(feature = "rpc")]
pub mod transaction;
pub mod types;
pub mod verify;

pub use config::{MAX_SIGNATURE_LIMIT, VerifierConfig};
pub use error::{TransactionError, VerifyError};
pub use link::{PaymentLink, generate_reference};
#[cfg(feature = "rpc")]
pub use transaction::{build_unsigned_transfer, serialize_transfer_transaction};
pub use types::*;
pub use verify::ReferenceVerifier;
