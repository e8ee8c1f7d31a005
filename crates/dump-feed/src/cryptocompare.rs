//! CryptoCompare spot quotes for centralized exchanges.
//!
//! `GET {base}/spot/v1/latest/tick?market={market}&instruments={BASE-QUOTE}`
//! answers with `{"Data": {"BASE-QUOTE": {"PRICE": ...}}}`. One request
//! per exchange, sent concurrently.

use crate::batch::{http_client, send_json};
use crate::config::CexSourceConfig;
use crate::error::{FeedError, FeedResult};
use crate::one_inch::parse_price;
use dump_core::{Exchange, Price, TokenView, TradePair};
use dump_detector::{BoxFuture, CexPriceMap, CexPriceSource, DetectorResult};
use futures_util::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

const SOURCE_NAME: &str = "cryptocompare";

#[derive(Debug, Deserialize)]
struct TickResponse {
    #[serde(rename = "Data", default)]
    data: HashMap<String, Tick>,
}

#[derive(Debug, Deserialize)]
struct Tick {
    #[serde(rename = "PRICE", default)]
    price: Option<Value>,
}

/// CEX quote source backed by the CryptoCompare data API.
pub struct CryptoCompareCexSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CryptoCompareCexSource {
    pub fn new(config: &CexSourceConfig) -> FeedResult<Self> {
        config.validate().map_err(FeedError::Config)?;
        let api_key = config.resolved_api_key();
        if api_key.is_none() {
            debug!("No CryptoCompare API key configured, sending unauthenticated requests");
        }
        Ok(Self {
            client: http_client(config.request_timeout())?,
            base_url: config.base_url().to_string(),
            api_key,
        })
    }

    fn tick_url(&self, exchange: Exchange, pair: &TradePair) -> String {
        format!(
            "{}/spot/v1/latest/tick?market={}&instruments={}",
            self.base_url,
            exchange.market(),
            pair.instrument()
        )
    }

    async fn fetch_one(&self, exchange: Exchange, pair: &TradePair) -> FeedResult<Price> {
        let mut request = self
            .client
            .get(self.tick_url(exchange, pair))
            .header("accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("authorization", format!("Apikey {key}"));
        }
        let body: TickResponse = send_json(request).await?;
        let instrument = pair.instrument();
        body.data
            .get(&instrument)
            .and_then(|tick| tick.price.as_ref())
            .and_then(parse_price)
            .filter(|price| !price.inner().is_sign_negative())
            .ok_or_else(|| FeedError::Parse(format!("no {instrument} price on {exchange}")))
    }

    /// Quote `token` on every exchange in `exchanges` it has a pair on.
    ///
    /// A failed exchange is logged and skipped. Fails only when every
    /// attempted exchange failed.
    pub async fn fetch(&self, token: &TokenView, exchanges: &[Exchange]) -> FeedResult<CexPriceMap> {
        let listed: Vec<(Exchange, &TradePair)> = exchanges
            .iter()
            .filter_map(|e| token.trade_pairs.get(e).map(|pair| (*e, pair)))
            .collect();
        if listed.is_empty() {
            return Ok(CexPriceMap::new());
        }

        let total = listed.len();
        let results = join_all(listed.into_iter().map(|(exchange, pair)| async move {
            (exchange, self.fetch_one(exchange, pair).await)
        }))
        .await;

        let mut prices = CexPriceMap::new();
        let mut last_error = String::new();
        for (exchange, result) in results {
            match result {
                Ok(price) => {
                    debug!(symbol = %token.symbol, %exchange, %price, "CEX price loaded");
                    prices.insert(exchange, price);
                }
                Err(e) => {
                    warn!(symbol = %token.symbol, %exchange, error = %e, "Failed to load CEX price");
                    last_error = e.to_string();
                }
            }
        }

        if prices.is_empty() {
            return Err(FeedError::AllBatchesFailed {
                source_name: SOURCE_NAME,
                batches: total,
                last_error,
            });
        }
        Ok(prices)
    }
}

impl CexPriceSource for CryptoCompareCexSource {
    fn dollar_prices<'a>(
        &'a self,
        token: &'a TokenView,
        exchanges: &'a [Exchange],
    ) -> BoxFuture<'a, DetectorResult<CexPriceMap>> {
        Box::pin(async move { Ok(self.fetch(token, exchanges).await?) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn source() -> CryptoCompareCexSource {
        let config = CexSourceConfig {
            base_url: Some("https://cc.example/".to_string()),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        CryptoCompareCexSource::new(&config).unwrap()
    }

    #[test]
    fn test_tick_url() {
        assert_eq!(
            source().tick_url(Exchange::Binance, &TradePair::new("pepe", "usdt")),
            "https://cc.example/spot/v1/latest/tick?market=binance&instruments=PEPE-USDT"
        );
    }

    #[test]
    fn test_tick_response_parses() {
        let body: TickResponse = serde_json::from_str(
            r#"{"Data":{"PEPE-USDT":{"TYPE":"952","PRICE":0.00001012}},"Err":{}}"#,
        )
        .unwrap();
        let price = body.data["PEPE-USDT"].price.as_ref().and_then(parse_price);
        assert_eq!(price, Some(Price::new(dec!(0.00001012))));
    }

    #[tokio::test]
    async fn test_unlisted_token_skips_requests() {
        let token = TokenView::new("pepe", "Pepe", Vec::new());
        let prices = source().fetch(&token, &Exchange::ALL).await.unwrap();
        assert!(prices.is_empty());
    }
}
