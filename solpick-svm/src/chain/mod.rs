//! Solana ledger access.
//!
//! # Key Types
//!
//! - [`Address`] - A Solana public key (base58-encoded)
//! - [`LedgerHistory`] - Read interface over recent signatures and parsed transactions
//! - [`RpcClient`] - JSON-RPC implementation of [`LedgerHistory`] (feature `rpc`)
//! - [`ParsedTransaction`] - The `jsonParsed` view of a transaction

mod address;
pub use address::*;

/// Read interface and provider errors.
pub mod provider;
pub use provider::*;

/// JSON-RPC wire types.
pub mod types;
pub use types::*;

/// HTTP JSON-RPC client.
#[cfg(feature = "rpc")]
pub mod rpc;
#[cfg(feature = "rpc")]
pub use rpc::RpcClient;
