//! 1inch spot-price API source.
//!
//! `GET {base}/{chain_id}/{addr1,addr2,...}?currency=USD` answers with a
//! JSON object mapping lowercase address to USD price.

use crate::batch::{fetch_batches, get_json, http_client, plan_batches, Batch};
use crate::config::PriceSourceConfig;
use crate::error::FeedResult;
use crate::rate_limit::RequestLimiter;
use dump_core::{ContractId, Price};
use dump_detector::{BoxFuture, DetectorResult, PriceMap, PriceSource};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, trace};

const SOURCE_NAME: &str = "one_inch";

/// Price source backed by the 1inch spot-price API.
pub struct OneInchPriceSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    batch_size: usize,
    max_concurrent: usize,
    limiter: Option<RequestLimiter>,
}

impl OneInchPriceSource {
    pub fn new(config: &PriceSourceConfig) -> FeedResult<Self> {
        let client = http_client(config.request_timeout())?;
        let api_key = config.resolved_api_key();
        if api_key.is_none() {
            debug!("No 1inch API key configured, sending unauthenticated requests");
        }
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            api_key,
            batch_size: config.batch_size(),
            max_concurrent: config.max_concurrent_requests,
            limiter: config.requests_per_second().map(RequestLimiter::per_second),
        })
    }

    fn batch_url(&self, batch: &Batch) -> String {
        format!(
            "{}/{}/{}?currency=USD",
            self.base_url,
            batch.network.chain_id(),
            batch.joined_addresses()
        )
    }

    async fn fetch_batch(&self, batch: Batch) -> FeedResult<PriceMap> {
        let url = self.batch_url(&batch);
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }
        let body: HashMap<String, Value> =
            get_json(&self.client, &url, self.api_key.as_deref()).await?;
        Ok(match_prices(&batch.contracts, &body))
    }

    pub async fn fetch(&self, contracts: &[ContractId]) -> FeedResult<PriceMap> {
        let batches = plan_batches(contracts, self.batch_size);
        fetch_batches(SOURCE_NAME, batches, self.max_concurrent, |batch| {
            self.fetch_batch(batch)
        })
        .await
    }
}

impl PriceSource for OneInchPriceSource {
    fn load_prices<'a>(&'a self, contracts: &'a [ContractId]) -> BoxFuture<'a, DetectorResult<PriceMap>> {
        Box::pin(async move { Ok(self.fetch(contracts).await?) })
    }
}

/// Pick the requested contracts out of a response body.
///
/// Keys match case-insensitively. Missing, unparseable and negative
/// prices are dropped.
pub(crate) fn match_prices(requested: &[ContractId], body: &HashMap<String, Value>) -> PriceMap {
    let by_address: HashMap<String, &Value> = body
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v))
        .collect();

    requested
        .iter()
        .filter_map(|contract| {
            let value = by_address.get(contract.address())?;
            match parse_price(value) {
                Some(price) if !price.inner().is_sign_negative() => Some((contract.clone(), price)),
                _ => {
                    trace!(%contract, %value, "Dropping unusable price");
                    None
                }
            }
        })
        .collect()
}

pub(crate) fn parse_price(value: &Value) -> Option<Price> {
    match value {
        Value::String(s) => Price::from_str(s.trim()).ok(),
        Value::Number(n) => Price::from_str(&n.to_string()).ok(),
        _ => None,
    }
}
