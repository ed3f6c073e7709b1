use crate::error::{ConfigError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Network every registry must carry; unknown names resolve to it.
pub const PRIMARY_NETWORK: &str = "sepolia";

const SEPOLIA_ENDPOINTS: &[&str] = &[
    "https://eth-sepolia.g.alchemy.com/v2/demo",
    "https://rpc.sepolia.org",
    "https://rpc2.sepolia.org",
    "https://ethereum-sepolia-rpc.publicnode.com",
];

const MUMBAI_ENDPOINTS: &[&str] = &[
    "https://polygon-mumbai-bor.publicnode.com",
    "https://rpc-mumbai.maticvigil.com",
];

const MAINNET_ENDPOINTS: &[&str] = &[
    "https://eth-mainnet.g.alchemy.com/v2/demo",
    "https://cloudflare-eth.com",
    "https://ethereum-rpc.publicnode.com",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Network {
    Sepolia,
    Mumbai,
    Mainnet,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Sepolia, Network::Mumbai, Network::Mainnet];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sepolia => "sepolia",
            Self::Mumbai => "mumbai",
            Self::Mainnet => "mainnet",
        }
    }

    pub fn is_testnet(self) -> bool {
        !matches!(self, Self::Mainnet)
    }

    pub fn config(self) -> NetworkConfig {
        match self {
            Self::Sepolia => NetworkConfig::sepolia(),
            Self::Mumbai => NetworkConfig::mumbai(),
            Self::Mainnet => NetworkConfig::mainnet(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sepolia" => Ok(Self::Sepolia),
            "mumbai" => Ok(Self::Mumbai),
            "mainnet" => Ok(Self::Mainnet),
            other => Err(ConfigError::Invalid(format!("unknown network `{other}`"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub network: Network,
    pub name: String,
    pub chain_id: u64,
    pub explorer: String,
    pub currency: String,
    pub endpoints: Vec<String>,
}

impl NetworkConfig {
    pub fn sepolia() -> Self {
        Self {
            network: Network::Sepolia,
            name: "Sepolia Testnet".to_string(),
            chain_id: 11_155_111,
            explorer: "https://sepolia.etherscan.io".to_string(),
            currency: "ETH".to_string(),
            endpoints: to_owned_urls(SEPOLIA_ENDPOINTS),
        }
    }

    pub fn mumbai() -> Self {
        Self {
            network: Network::Mumbai,
            name: "Polygon Mumbai".to_string(),
            chain_id: 80_001,
            explorer: "https://mumbai.polygonscan.com".to_string(),
            currency: "MATIC".to_string(),
            endpoints: to_owned_urls(MUMBAI_ENDPOINTS),
        }
    }

    pub fn mainnet() -> Self {
        Self {
            network: Network::Mainnet,
            name: "Ethereum Mainnet".to_string(),
            chain_id: 1,
            explorer: "https://etherscan.io".to_string(),
            currency: "ETH".to_string(),
            endpoints: to_owned_urls(MAINNET_ENDPOINTS),
        }
    }

    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer, address)
    }

    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer, tx_hash)
    }
}

fn to_owned_urls(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|url| (*url).to_string()).collect()
}

/// Immutable network → ordered endpoint table shared by every proxy call.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    networks: Arc<BTreeMap<String, NetworkConfig>>,
}

impl EndpointRegistry {
    pub fn new(configs: Vec<NetworkConfig>) -> Result<Self> {
        let mut networks = BTreeMap::new();
        for config in configs {
            if config.endpoints.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "network `{}` has no RPC endpoints",
                    config.network
                ))
                .into());
            }
            for url in &config.endpoints {
                validate_endpoint_url(config.network, url)?;
            }
            networks.insert(config.network.as_str().to_string(), config);
        }
        if !networks.contains_key(PRIMARY_NETWORK) {
            return Err(ConfigError::Missing(format!(
                "primary network `{PRIMARY_NETWORK}` must be configured"
            ))
            .into());
        }
        Ok(Self {
            networks: Arc::new(networks),
        })
    }

    pub fn builtin() -> Self {
        let networks = Network::ALL
            .iter()
            .map(|network| {
                let config = network.config();
                (network.as_str().to_string(), config)
            })
            .collect();
        Self {
            networks: Arc::new(networks),
        }
    }

    /// Resolve a network by name, falling back to the primary network for unknown names.
    pub fn resolve(&self, name: &str) -> &NetworkConfig {
        let key = name.trim().to_ascii_lowercase();
        match self.networks.get(&key) {
            Some(config) => config,
            // Constructors guarantee the primary entry exists.
            None => {
                tracing::debug!(
                    "[RPC] Unknown network `{}`; using primary `{}`",
                    name,
                    PRIMARY_NETWORK
                );
                &self.networks[PRIMARY_NETWORK]
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.values()
    }
}

fn validate_endpoint_url(network: Network, raw: &str) -> Result<()> {
    let parsed = raw.parse::<reqwest::Url>().map_err(|e| {
        ConfigError::Invalid(format!(
            "endpoint for `{network}` must be a valid URL, got `{raw}`: {e}"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid(format!(
            "endpoint for `{network}` must use http(s) scheme, got `{other}`"
        ))
        .into()),
    }
}
