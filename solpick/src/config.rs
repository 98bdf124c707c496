//! SDK configuration.
//!
//! Endpoints are carried in an explicit [`SdkConfig`] value handed to the
//! components that need them; nothing in the library reads the process
//! environment on its own. [`SdkConfig::from_env`] exists for binaries that want
//! the conventional variables.
//!
//! # Environment Variables
//!
//! - `SOLANA_RPC_URL` - JSON-RPC endpoint (default: `https://api.mainnet-beta.solana.com`)
//! - `HOSTED_PICK_BASE_URL` - hosted payment page (default: `http://localhost:3000/pick`)

use serde::{Deserialize, Serialize};
use url::Url;

/// Default Solana JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Default base URL of the hosted payment page.
pub const DEFAULT_HOSTED_PICK_BASE_URL: &str = "http://localhost:3000/pick";

/// Error raised when a configured URL cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid URL in {variable}: {source}")]
pub struct ConfigError {
    /// Name of the offending setting.
    pub variable: &'static str,
    /// The underlying parse error.
    #[source]
    pub source: url::ParseError,
}

/// Endpoints used by the SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkConfig {
    /// Solana JSON-RPC endpoint used for ledger queries.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: Url,

    /// Base URL of the hosted payment page.
    #[serde(default = "default_hosted_pick_base_url")]
    pub hosted_pick_base_url: Url,
}

fn default_rpc_url() -> Url {
    Url::parse(DEFAULT_RPC_URL).expect("default RPC URL is valid")
}

fn default_hosted_pick_base_url() -> Url {
    Url::parse(DEFAULT_HOSTED_PICK_BASE_URL).expect("default hosted pick URL is valid")
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            hosted_pick_base_url: default_hosted_pick_base_url(),
        }
    }
}

impl SdkConfig {
    /// Reads `SOLANA_RPC_URL` and `HOSTED_PICK_BASE_URL`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to something that is not a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`], with variables resolved through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a resolved value is not a URL.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup("SOLANA_RPC_URL").filter(|v| !v.trim().is_empty()) {
            config.rpc_url = parse_url("SOLANA_RPC_URL", &raw)?;
        }
        if let Some(raw) = lookup("HOSTED_PICK_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.hosted_pick_base_url = parse_url("HOSTED_PICK_BASE_URL", &raw)?;
        }
        Ok(config)
    }
}

fn parse_url(variable: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|source| ConfigError { variable, source })
}
