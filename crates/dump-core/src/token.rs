//! Token display metadata.

use crate::contract::{ContractId, Network};
use crate::exchange::{Exchange, TradePair};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Most liquid DEX pool known for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPool {
    /// DEX name (e.g., "uniswap").
    pub dex: String,
    /// Pool pair label (e.g., "PEPE/WETH").
    pub pair: String,
    /// Pool liquidity in USD.
    pub usd: Decimal,
}

/// Read-only view of a tracked token.
///
/// Resolved from the registry when a signal is raised; the detector
/// never looks inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenView {
    pub symbol: String,
    pub name: String,
    /// All deployments of this token, primary contract first.
    pub contracts: Vec<ContractId>,
    #[serde(default)]
    pub deployed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub market_cap_usd: Option<Decimal>,
    #[serde(default)]
    pub volume_24h_usd: Option<Decimal>,
    #[serde(default)]
    pub liquidity: Option<LiquidityPool>,
    /// Centralized exchange listings, used for spread quotes.
    #[serde(default)]
    pub trade_pairs: BTreeMap<Exchange, TradePair>,
}

impl TokenView {
    /// Minimal view with only identity fields set.
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, contracts: Vec<ContractId>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            contracts,
            deployed_at: None,
            market_cap_usd: None,
            volume_24h_usd: None,
            liquidity: None,
            trade_pairs: BTreeMap::new(),
        }
    }

    /// Placeholder for a contract the registry no longer knows.
    pub fn unresolved(contract: &ContractId) -> Self {
        Self::new(contract.address(), contract.address(), vec![contract.clone()])
    }

    /// The primary (first listed) contract.
    pub fn identity_contract(&self) -> Option<&ContractId> {
        self.contracts.first()
    }

    /// Deployment of this token on `network`, if any.
    pub fn contract_on(&self, network: Network) -> Option<&ContractId> {
        self.contracts.iter().find(|c| c.network() == network)
    }

    /// Exchanges from `wanted` this token has a pair on.
    pub fn listed_on(&self, wanted: &[Exchange]) -> Vec<Exchange> {
        wanted
            .iter()
            .copied()
            .filter(|e| self.trade_pairs.contains_key(e))
            .collect()
    }

    /// Whole days since deployment.
    pub fn age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.deployed_at.map(|t| (now - t).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> TokenView {
        TokenView::new(
            "pepe",
            "Pepe",
            vec![
                ContractId::new("0x6982508145454ce325ddbe47a25d4ec3d2311933", Network::Ethereum),
                ContractId::new("0x25d887ce7a35172c62febfd67a1856f20faebb00", Network::Arbitrum),
            ],
        )
    }

    #[test]
    fn test_contract_on_network() {
        let token = sample();
        assert_eq!(
            token.contract_on(Network::Arbitrum).map(|c| c.address()),
            Some("0x25d887ce7a35172c62febfd67a1856f20faebb00")
        );
        assert!(token.contract_on(Network::Base).is_none());
        assert_eq!(token.identity_contract().map(|c| c.network()), Some(Network::Ethereum));
    }

    #[test]
    fn test_age_days() {
        let now = Utc::now();
        let mut token = sample();
        assert!(token.age_days(now).is_none());

        token.deployed_at = Some(now - Duration::days(12) - Duration::hours(3));
        assert_eq!(token.age_days(now), Some(12));
    }

    #[test]
    fn test_listed_on_filters_by_pairs() {
        let mut token = sample();
        assert!(token.listed_on(&Exchange::ALL).is_empty());

        token
            .trade_pairs
            .insert(Exchange::Binance, TradePair::new("PEPE", "USDT"));
        assert_eq!(token.listed_on(&Exchange::ALL), vec![Exchange::Binance]);
        assert!(token.listed_on(&[]).is_empty());
    }

    #[test]
    fn test_trade_pairs_from_json() {
        let token: TokenView = serde_json::from_str(
            r#"{"symbol":"pepe","name":"Pepe","contracts":[],
                "trade_pairs":{"binance":{"base":"PEPE","quote":"USDT"}}}"#,
        )
        .unwrap();
        assert_eq!(token.trade_pairs[&Exchange::Binance].instrument(), "PEPE-USDT");
    }

    #[test]
    fn test_unresolved_uses_address() {
        let contract = ContractId::new("0xabc0000000000000000000000000000000000001", Network::Base);
        let view = TokenView::unresolved(&contract);
        assert_eq!(view.symbol, contract.address());
        assert_eq!(view.contracts, vec![contract]);
    }
}
