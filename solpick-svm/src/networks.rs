//! Well-known Solana clusters and their public RPC endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Static metadata for a public Solana cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterInfo {
    /// Cluster the entry describes.
    pub cluster: SolanaCluster,
    /// Canonical name, as used by wallets and explorers.
    pub name: &'static str,
    /// Public JSON-RPC endpoint run by Solana Labs.
    pub rpc_url: &'static str,
}

/// Public Solana clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolanaCluster {
    /// Production cluster.
    MainnetBeta,
    /// Development cluster with free airdrops.
    Devnet,
    /// Validator release testing cluster.
    Testnet,
}

const MAINNET_BETA: ClusterInfo = ClusterInfo {
    cluster: SolanaCluster::MainnetBeta,
    name: "mainnet-beta",
    rpc_url: "https://api.mainnet-beta.solana.com",
};

const DEVNET: ClusterInfo = ClusterInfo {
    cluster: SolanaCluster::Devnet,
    name: "devnet",
    rpc_url: "https://api.devnet.solana.com",
};

const TESTNET: ClusterInfo = ClusterInfo {
    cluster: SolanaCluster::Testnet,
    name: "testnet",
    rpc_url: "https://api.testnet.solana.com",
};

/// Every known cluster.
pub static SOLANA_CLUSTERS: &[ClusterInfo] = &[MAINNET_BETA, DEVNET, TESTNET];

impl SolanaCluster {
    /// Metadata entry for this cluster.
    #[must_use]
    pub const fn info(self) -> &'static ClusterInfo {
        match self {
            Self::MainnetBeta => &MAINNET_BETA,
            Self::Devnet => &DEVNET,
            Self::Testnet => &TESTNET,
        }
    }

    /// Public RPC endpoint for this cluster.
    #[must_use]
    pub const fn rpc_url(self) -> &'static str {
        self.info().rpc_url
    }

    /// Canonical cluster name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.info().name
    }
}

impl fmt::Display for SolanaCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned for an unrecognized cluster name.
#[derive(Debug, thiserror::Error)]
#[error("Unknown Solana cluster {0}")]
pub struct UnknownCluster(String);

impl FromStr for SolanaCluster {
    type Err = UnknownCluster;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let name = match name.as_str() {
            "mainnet" | "solana" => "mainnet-beta",
            other => other,
        };
        SOLANA_CLUSTERS
            .iter()
            .find(|info| info.name == name)
            .map(|info| info.cluster)
            .ok_or_else(|| UnknownCluster(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(
            "devnet".parse::<SolanaCluster>().unwrap().rpc_url(),
            "https://api.devnet.solana.com"
        );
        assert_eq!(
            " Mainnet ".parse::<SolanaCluster>().unwrap(),
            SolanaCluster::MainnetBeta
        );
        assert!("localnet".parse::<SolanaCluster>().is_err());
    }

    #[test]
    fn test_every_cluster_has_an_entry() {
        for cluster in [
            SolanaCluster::MainnetBeta,
            SolanaCluster::Devnet,
            SolanaCluster::Testnet,
        ] {
            assert_eq!(cluster.info().cluster, cluster);
            assert_eq!(cluster.to_string().parse::<SolanaCluster>().unwrap(), cluster);
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&SolanaCluster::MainnetBeta).unwrap(),
            "\"mainnet-beta\""
        );
    }
}
