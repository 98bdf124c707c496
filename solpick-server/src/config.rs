//! Server configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 5000
//! cluster = "devnet"
//! hosted_pick_base_url = "https://pay.example.com/pick"
//! payment_ttl_secs = 1800
//! sweep_interval_secs = 600
//!
//! [rate_limit]
//! window_ms = 900000
//! max = 100
//!
//! [verifier]
//! signatureLimit = 10
//! fetchConcurrency = 1
//!
//! [retry]
//! max_retries = 3
//! initial_delay_ms = 1000
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.toml`)
//! - `HOST`, `PORT` - Override the bind address
//! - `SOLANA_RPC_URL` - Override the JSON-RPC endpoint
//! - `SOLANA_CLUSTER` - Use a public cluster's endpoint (`mainnet-beta`, `devnet`, `testnet`)
//! - `HOSTED_PICK_BASE_URL` - Override the hosted payment page
//! - `RATE_LIMIT_WINDOW` - Override the rate limit window (milliseconds)
//! - `RATE_LIMIT_MAX` - Override the per-IP request budget

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solpick::{RetryPolicy, SdkConfig};
use solpick_svm::SolanaCluster;
use solpick_svm::pay::VerifierConfig;
use url::Url;

use crate::rate_limit::RateLimitConfig;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Can not read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`ServerConfig`].
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    /// An environment override could not be parsed.
    #[error("Invalid value for {variable}: {value:?}")]
    InvalidOverride {
        /// Variable name.
        variable: &'static str,
        /// Rejected value.
        value: String,
    },
}

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `5000`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Solana JSON-RPC endpoint. Takes precedence over `cluster`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,

    /// Public cluster whose endpoint is used when `rpc_url` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<SolanaCluster>,

    /// Base URL of the hosted payment page.
    #[serde(default = "default_hosted_pick_base_url")]
    pub hosted_pick_base_url: Url,

    /// Seconds a payment request stays live after creation (default: 30 minutes).
    #[serde(default = "default_payment_ttl_secs")]
    pub payment_ttl_secs: u64,

    /// Seconds between expiry sweeps (default: 10 minutes, at least 1).
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Per-IP rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Reference verifier tuning.
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Backoff for rate-limited verification calls.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Backoff settings for the verification route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds, doubled each time (default: 1000).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// The equivalent [`RetryPolicy`].
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.initial_delay_ms),
        )
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
}

const fn default_port() -> u16 {
    5000
}

fn default_hosted_pick_base_url() -> Url {
    SdkConfig::default().hosted_pick_base_url
}

const fn default_payment_ttl_secs() -> u64 {
    1_800
}

const fn default_sweep_interval_secs() -> u64 {
    600
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_delay_ms() -> u64 {
    1_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rpc_url: None,
            cluster: None,
            hosted_pick_base_url: default_hosted_pick_base_url(),
            payment_ttl_secs: default_payment_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            rate_limit: RateLimitConfig::default(),
            verifier: VerifierConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from `path`, or from defaults if the file does not exist.
    ///
    /// `$VAR` / `${VAR}` references in the file are expanded from the process
    /// environment, then the override variables listed in the module docs are
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or an
    /// override variable holds an invalid value.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Same as [`Self::load_from`], with variables resolved through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`Self::load_from`].
    pub fn load_with<F>(path: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };
        let mut config = Self::parse_with(&content, &lookup)?;
        config.apply_overrides(&lookup)?;
        Ok(config)
    }

    /// Parses TOML text after expanding variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the expanded text is not valid.
    pub fn parse_with<F>(content: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = expand_env_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = parse_override("HOST", &host)?;
        }
        if let Some(port) = lookup("PORT") {
            self.port = parse_override("PORT", &port)?;
        }
        if let Some(url) = lookup("SOLANA_RPC_URL").filter(|v| !v.trim().is_empty()) {
            self.rpc_url = Some(parse_override("SOLANA_RPC_URL", &url)?);
        }
        if let Some(cluster) = lookup("SOLANA_CLUSTER").filter(|v| !v.trim().is_empty()) {
            self.cluster = Some(parse_override("SOLANA_CLUSTER", &cluster)?);
        }
        if let Some(url) = lookup("HOSTED_PICK_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.hosted_pick_base_url = parse_override("HOSTED_PICK_BASE_URL", &url)?;
        }
        if let Some(window) = lookup("RATE_LIMIT_WINDOW") {
            self.rate_limit.window_ms = parse_override("RATE_LIMIT_WINDOW", &window)?;
        }
        if let Some(max) = lookup("RATE_LIMIT_MAX") {
            self.rate_limit.max = parse_override("RATE_LIMIT_MAX", &max)?;
        }
        Ok(())
    }

    /// The JSON-RPC endpoint: `rpc_url`, else the cluster's public endpoint,
    /// else mainnet-beta.
    #[must_use]
    pub fn resolved_rpc_url(&self) -> Url {
        self.rpc_url
            .clone()
            .or_else(|| {
                self.cluster
                    .and_then(|cluster| Url::parse(cluster.rpc_url()).ok())
            })
            .unwrap_or_else(|| SdkConfig::default().rpc_url)
    }

    /// How long payment requests stay live after creation.
    #[must_use]
    pub const fn payment_ttl(&self) -> Duration {
        Duration::from_secs(self.payment_ttl_secs)
    }

    /// Time between expiry sweeps, never less than one second.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(if self.sweep_interval_secs == 0 {
            1
        } else {
            self.sweep_interval_secs
        })
    }
}

fn parse_override<T: std::str::FromStr>(
    variable: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride {
            variable,
            value: value.to_owned(),
        })
}

/// Expands `$VAR` and `${VAR}` patterns in a string through `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_env_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match lookup(&name).filter(|_| !name.is_empty()) {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ServerConfig::parse_with("", env(&[])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert_eq!(config.payment_ttl(), Duration::from_secs(1_800));
        assert_eq!(config.sweep_interval(), Duration::from_secs(600));
        assert_eq!(config.retry.policy().max_retries, 3);
        assert_eq!(config.verifier.signature_limit, 10);
        assert_eq!(config.rate_limit.max, 100);
    }

    #[test]
    fn test_expands_variables() {
        let lookup = env(&[("RPC", "https://api.devnet.solana.com"), ("PORT_NUM", "8080")]);
        let config = ServerConfig::parse_with(
            "rpc_url = \"${RPC}\"\nport = $PORT_NUM\n",
            lookup,
        )
        .unwrap();
        assert_eq!(
            config.resolved_rpc_url().host_str(),
            Some("api.devnet.solana.com")
        );
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_unresolved_variables_kept() {
        let lookup = env(&[]);
        assert_eq!(expand_env_vars("a $MISSING b ${ALSO} $", lookup), "a $MISSING b ${ALSO} $");
    }

    #[test]
    fn test_sections() {
        let config = ServerConfig::parse_with(
            "[rate_limit]\nmax = 5\n[verifier]\nsignatureLimit = 25\n[retry]\nmax_retries = 1\n",
            env(&[]),
        )
        .unwrap();
        assert_eq!(config.rate_limit.max, 5);
        assert_eq!(config.rate_limit.window_ms, 900_000);
        assert_eq!(config.verifier.signature_limit, 25);
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.initial_delay_ms, 1_000);
    }

    #[test]
    fn test_env_overrides() {
        let lookup = env(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "7000"),
            ("SOLANA_RPC_URL", "https://rpc.example.com"),
            ("RATE_LIMIT_WINDOW", "60000"),
            ("RATE_LIMIT_MAX", "10"),
        ]);
        let config = ServerConfig::load_with("/nonexistent/config.toml", lookup).unwrap();
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.port, 7000);
        assert_eq!(
            config.resolved_rpc_url().host_str(),
            Some("rpc.example.com")
        );
        assert_eq!(config.rate_limit.window_ms, 60_000);
        assert_eq!(config.rate_limit.max, 10);
    }

    #[test]
    fn test_bad_override_names_variable() {
        let err = ServerConfig::load_with("/nonexistent/config.toml", env(&[("PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { variable: "PORT", .. }));
    }

    #[test]
    fn test_cluster_selects_public_endpoint() {
        let config = ServerConfig::parse_with("cluster = \"devnet\"\n", env(&[])).unwrap();
        assert_eq!(config.cluster, Some(SolanaCluster::Devnet));
        assert_eq!(
            config.resolved_rpc_url().as_str(),
            "https://api.devnet.solana.com/"
        );

        let config = ServerConfig::parse_with(
            "cluster = \"devnet\"\nrpc_url = \"https://rpc.example.com\"\n",
            env(&[]),
        )
        .unwrap();
        assert_eq!(config.resolved_rpc_url().host_str(), Some("rpc.example.com"));

        let config = ServerConfig::load_with(
            "/nonexistent/config.toml",
            env(&[("SOLANA_CLUSTER", "testnet")]),
        )
        .unwrap();
        assert_eq!(
            config.resolved_rpc_url().host_str(),
            Some("api.testnet.solana.com")
        );
    }

    #[test]
    fn test_default_endpoint_is_mainnet() {
        let config = ServerConfig::default();
        assert_eq!(
            config.resolved_rpc_url().host_str(),
            Some("api.mainnet-beta.solana.com")
        );
    }

    #[test]
    fn test_zero_sweep_interval_is_clamped() {
        let config = ServerConfig::parse_with("sweep_interval_secs = 0\n", env(&[])).unwrap();
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
