//! Contract identification types.
//!
//! A token may be deployed on several networks; each deployment is
//! priced independently, so the price-series key is the pair
//! (address, network) rather than the token itself.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// EVM network a contract is deployed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Bsc,
    Polygon,
    Optimism,
    Arbitrum,
    Base,
}

impl Network {
    pub const ALL: [Network; 6] = [
        Network::Ethereum,
        Network::Bsc,
        Network::Polygon,
        Network::Optimism,
        Network::Arbitrum,
        Network::Base,
    ];

    /// EVM chain id (used by the 1inch API path).
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Ethereum => 1,
            Network::Bsc => 56,
            Network::Polygon => 137,
            Network::Optimism => 10,
            Network::Arbitrum => 42161,
            Network::Base => 8453,
        }
    }

    /// Chain slug used by DexScreener in `chainId` fields and URLs.
    pub fn dexscreener_slug(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Bsc => "bsc",
            Network::Polygon => "polygon",
            Network::Optimism => "optimism",
            Network::Arbitrum => "arbitrum",
            Network::Base => "base",
        }
    }

    /// Resolve a network from its DexScreener chain slug.
    pub fn from_dexscreener_slug(slug: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|n| n.dexscreener_slug().eq_ignore_ascii_case(slug))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dexscreener_slug())
    }
}

impl FromStr for Network {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_dexscreener_slug(s.trim()).ok_or_else(|| CoreError::UnknownNetwork(s.to_string()))
    }
}

/// Unique contract identifier combining address and network.
///
/// This is the primary key of every price series. Addresses are
/// lowercased on construction, so checksum casing never splits one
/// contract into two identities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawContractId")]
pub struct ContractId {
    address: String,
    network: Network,
}

/// Unvalidated form used for deserialization.
#[derive(Deserialize)]
struct RawContractId {
    address: String,
    network: Network,
}

impl TryFrom<RawContractId> for ContractId {
    type Error = CoreError;

    fn try_from(raw: RawContractId) -> Result<Self> {
        Self::try_new(&raw.address, raw.network)
    }
}

impl ContractId {
    /// Create a contract id without validating the address format.
    pub fn new(address: impl AsRef<str>, network: Network) -> Self {
        Self {
            address: address.as_ref().trim().to_ascii_lowercase(),
            network,
        }
    }

    /// Create a contract id, requiring a `0x`-prefixed 20-byte hex address.
    pub fn try_new(address: &str, network: Network) -> Result<Self> {
        let trimmed = address.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| CoreError::InvalidAddress(format!("{trimmed}: missing 0x prefix")))?;

        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidAddress(format!(
                "{trimmed}: expected 40 hex digits"
            )));
        }

        Ok(Self::new(trimmed, network))
    }

    /// Lowercased contract address.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn network(&self) -> Network {
        self.network
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.network, self.address)
    }
}
