#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for Solana payment links.
//!
//! This crate holds the chain-agnostic building blocks shared by the Solana
//! support crate and the backend service: exact decimal amounts, a retry helper
//! for rate-limited RPC endpoints, timestamps for payment request bookkeeping,
//! QR rendering and the SDK configuration.
//!
//! # Modules
//!
//! - [`amount`] - Decimal amount parsing and minor-unit conversion
//! - [`config`] - Explicit endpoint configuration
//! - [`qr`] - QR code rendering (feature `qr`)
//! - [`retry`] - Exponential backoff on rate-limit errors
//! - [`timestamp`] - Unix timestamps and expiry checks
//!
//! # Feature Flags
//!
//! - `qr` - Enables QR code rendering
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod amount;
pub mod config;
#[cfg(feature = "qr")]
pub mod qr;
pub mod retry;
pub mod timestamp;

pub use amount::{AmountError, AmountInput, DecimalAmount};
pub use config::SdkConfig;
pub use retry::{RetryPolicy, Retryable, with_retry};
pub use timestamp::UnixTimestamp;
