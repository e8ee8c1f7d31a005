//! DexScreener pairs API source.
//!
//! `GET {base}/latest/dex/tokens/{a,b,...}` returns every pair whose base
//! or quote token is one of the addresses. A contract's price is the
//! `priceUsd` of its most liquid pair on the same chain where it is the
//! base token.

use crate::batch::{fetch_batches, get_json, http_client, plan_batches, Batch};
use crate::config::PriceSourceConfig;
use crate::error::FeedResult;
use crate::rate_limit::RequestLimiter;
use dump_core::{ContractId, Network, Price};
use dump_detector::{BoxFuture, DetectorResult, PriceMap, PriceSource};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

const SOURCE_NAME: &str = "dex_screener";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokensResponse {
    #[serde(default)]
    pub pairs: Option<Vec<PairInfo>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairInfo {
    pub chain_id: String,
    #[serde(default)]
    pub dex_id: Option<String>,
    #[serde(default)]
    pub pair_address: Option<String>,
    pub base_token: PairToken,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub liquidity: Option<PairLiquidity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairToken {
    pub address: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairLiquidity {
    #[serde(default)]
    pub usd: Option<Decimal>,
}

impl PairInfo {
    fn liquidity_usd(&self) -> Decimal {
        self.liquidity
            .as_ref()
            .and_then(|l| l.usd)
            .unwrap_or(Decimal::ZERO)
    }

    fn price(&self) -> Option<Price> {
        let raw = self.price_usd.as_deref()?;
        Price::from_str(raw.trim())
            .ok()
            .filter(|p| !p.inner().is_sign_negative())
    }
}

// ============================================================================
// Source
// ============================================================================

/// Price source backed by the DexScreener pairs API.
pub struct DexScreenerPriceSource {
    client: Client,
    base_url: String,
    batch_size: usize,
    max_concurrent: usize,
    limiter: Option<RequestLimiter>,
}

impl DexScreenerPriceSource {
    pub fn new(config: &PriceSourceConfig) -> FeedResult<Self> {
        Ok(Self {
            client: http_client(config.request_timeout())?,
            base_url: config.base_url().to_string(),
            batch_size: config.batch_size(),
            max_concurrent: config.max_concurrent_requests,
            limiter: config.requests_per_second().map(RequestLimiter::per_second),
        })
    }

    fn batch_url(&self, batch: &Batch) -> String {
        format!(
            "{}/latest/dex/tokens/{}",
            self.base_url,
            batch.joined_addresses()
        )
    }

    async fn fetch_batch(&self, batch: Batch) -> FeedResult<PriceMap> {
        let url = self.batch_url(&batch);
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }
        let body: TokensResponse = get_json(&self.client, &url, None).await?;
        Ok(select_prices(&batch.contracts, body.pairs.as_deref().unwrap_or_default()))
    }

    pub async fn fetch(&self, contracts: &[ContractId]) -> FeedResult<PriceMap> {
        let batches = plan_batches(contracts, self.batch_size);
        fetch_batches(SOURCE_NAME, batches, self.max_concurrent, |batch| {
            self.fetch_batch(batch)
        })
        .await
    }
}

impl PriceSource for DexScreenerPriceSource {
    fn load_prices<'a>(&'a self, contracts: &'a [ContractId]) -> BoxFuture<'a, DetectorResult<PriceMap>> {
        Box::pin(async move { Ok(self.fetch(contracts).await?) })
    }
}

/// Price each requested contract from its most liquid matching pair.
///
/// Pairs on unknown chains, pairs where the contract is only the quote
/// token and pairs without positive liquidity or a usable price are
/// ignored.
pub fn select_prices(requested: &[ContractId], pairs: &[PairInfo]) -> PriceMap {
    let wanted: HashSet<&ContractId> = requested.iter().collect();
    let mut best: HashMap<ContractId, (Decimal, Price)> = HashMap::new();

    for pair in pairs {
        let Some(network) = Network::from_dexscreener_slug(&pair.chain_id) else {
            continue;
        };
        let contract = ContractId::new(&pair.base_token.address, network);
        if !wanted.contains(&contract) {
            continue;
        }
        let liquidity = pair.liquidity_usd();
        if liquidity <= Decimal::ZERO {
            continue;
        }
        let Some(price) = pair.price() else {
            continue;
        };
        match best.get(&contract) {
            Some((current, _)) if *current >= liquidity => {}
            _ => {
                best.insert(contract, (liquidity, price));
            }
        }
    }

    best.into_iter()
        .map(|(contract, (_, price))| (contract, price))
        .collect()
}
