//! Centralized exchange spread quotes attached to signals.

use dump_core::{round_percent, spread_pct, Exchange, Price};
use dump_detector::{CexPriceSource, DumpSignal};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

/// A token's price on one exchange next to its DEX price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CexQuote {
    pub exchange: Exchange,
    pub price: Price,
    /// `(cex - dex) / dex * 100`, rounded to 2 places. `None` when the
    /// DEX price is zero.
    pub spread_pct: Option<Decimal>,
}

impl CexQuote {
    pub fn new(exchange: Exchange, price: Price, dex_price: Price) -> Self {
        Self {
            exchange,
            price,
            spread_pct: spread_pct(dex_price, price).map(round_percent),
        }
    }
}

/// Looks up CEX quotes for each signal before it is rendered.
#[derive(Clone)]
pub struct CexEnricher {
    source: Arc<dyn CexPriceSource>,
    exchanges: Vec<Exchange>,
}

impl CexEnricher {
    pub fn new(source: Arc<dyn CexPriceSource>, exchanges: Vec<Exchange>) -> Self {
        Self { source, exchanges }
    }

    /// Quotes for the signal's token, ordered by exchange.
    ///
    /// Tokens without a trade pair on a configured exchange are not
    /// looked up. A failed lookup is logged and yields no quotes.
    pub async fn quotes(&self, signal: &DumpSignal) -> Vec<CexQuote> {
        let exchanges = signal.token.listed_on(&self.exchanges);
        if exchanges.is_empty() {
            return Vec::new();
        }

        match self.source.dollar_prices(&signal.token, &exchanges).await {
            Ok(prices) => {
                debug!(symbol = %signal.token.symbol, quotes = prices.len(), "CEX quotes loaded");
                prices
                    .into_iter()
                    .map(|(exchange, price)| CexQuote::new(exchange, price, signal.current_price))
                    .collect()
            }
            Err(e) => {
                warn!(symbol = %signal.token.symbol, error = %e, "CEX quotes unavailable");
                Vec::new()
            }
        }
    }
}
