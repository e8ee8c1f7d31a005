//! Centralized exchange listings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Centralized exchange a token may be listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
}

impl Exchange {
    pub const ALL: [Exchange; 1] = [Exchange::Binance];

    /// Market identifier used by the CryptoCompare data API.
    pub fn market(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exchange::Binance => f.write_str("Binance"),
        }
    }
}

/// Spot pair a token trades as on an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradePair {
    pub base: String,
    pub quote: String,
}

impl TradePair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// Instrument symbol, e.g. `PEPE-USDT`.
    pub fn instrument(&self) -> String {
        format!("{}-{}", self.base.to_uppercase(), self.quote.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_is_uppercase() {
        assert_eq!(TradePair::new("pepe", "usdt").instrument(), "PEPE-USDT");
    }

    #[test]
    fn test_exchange_names() {
        assert_eq!(Exchange::Binance.to_string(), "Binance");
        assert_eq!(Exchange::Binance.market(), "binance");
        let parsed: Exchange = serde_json::from_str("\"binance\"").unwrap();
        assert_eq!(parsed, Exchange::Binance);
    }
}
