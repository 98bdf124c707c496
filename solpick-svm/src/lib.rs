#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Solana support for payment links.
//!
//! This crate knows how to ask a Solana cluster whether a payment request has
//! been paid, how to describe a payment request to a wallet, and how to build
//! the unsigned transfer a wallet signs.
//!
//! # Modules
//!
//! - [`chain`] - Addresses, the ledger read interface and the JSON-RPC client
//! - [`pay`] - Reference verification, payment links and transfer building
//! - [`networks`] - Well-known clusters
//!
//! # Feature Flags
//!
//! - `rpc` (default) - JSON-RPC client and transaction serialization
//! - `telemetry` - Tracing instrumentation
//!
//! # Example
//!
//! ```ignore
//! use solpick_svm::chain::RpcClient;
//! use solpick_svm::pay::{ReferenceVerifier, VerificationRequest, VerifierConfig};
//!
//! let rpc = RpcClient::new("https://api.devnet.solana.com".parse()?);
//! let verifier = ReferenceVerifier::new(rpc, VerifierConfig::default());
//! let request = VerificationRequest::parse(reference, recipient, "0.01")?;
//! match verifier.verify(&request).await? {
//!     Some(payment) => println!("paid in {}", payment.signature),
//!     None => println!("not yet"),
//! }
//! ```

pub mod chain;
pub mod networks;
pub mod pay;

pub use chain::{Address, AddressInput, LedgerHistory, ProviderError};
pub use networks::SolanaCluster;
pub use pay::{
    PaymentLink, ReferenceVerifier, VerificationRequest, VerifiedPayment, VerifierConfig,
    VerifyError,
};
