//! Batching and bounded-concurrency fan-out shared by the HTTP sources.

use crate::error::{FeedError, FeedResult};
use dump_core::{ContractId, Network};
use dump_detector::PriceMap;
use futures_util::stream::{self, StreamExt};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Contracts of one network sent in a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub network: Network,
    pub contracts: Vec<ContractId>,
}

impl Batch {
    /// Comma-joined lowercase addresses, as the APIs expect them.
    pub fn joined_addresses(&self) -> String {
        self.contracts
            .iter()
            .map(ContractId::address)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Group contracts by network and split each group into chunks of at
/// most `batch_size`. Duplicates are dropped.
pub fn plan_batches(contracts: &[ContractId], batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    let mut by_network: BTreeMap<Network, Vec<ContractId>> = BTreeMap::new();
    for contract in contracts {
        let group = by_network.entry(contract.network()).or_default();
        if !group.contains(contract) {
            group.push(contract.clone());
        }
    }

    by_network
        .into_iter()
        .flat_map(|(network, group)| {
            group
                .chunks(batch_size)
                .map(|chunk| Batch {
                    network,
                    contracts: chunk.to_vec(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Run `fetch` for every batch with at most `max_concurrent` in flight
/// and merge the results.
///
/// A failed batch is logged and skipped. Fails only when every batch
/// failed.
pub async fn fetch_batches<F, Fut>(
    source_name: &'static str,
    batches: Vec<Batch>,
    max_concurrent: usize,
    fetch: F,
) -> FeedResult<PriceMap>
where
    F: Fn(Batch) -> Fut,
    Fut: Future<Output = FeedResult<PriceMap>>,
{
    let total = batches.len();
    if total == 0 {
        return Ok(PriceMap::new());
    }

    let results: Vec<(Network, usize, FeedResult<PriceMap>)> = stream::iter(batches)
        .map(|batch| {
            let network = batch.network;
            let size = batch.contracts.len();
            let fut = fetch(batch);
            async move { (network, size, fut.await) }
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    let mut prices = PriceMap::new();
    let mut failed = 0;
    let mut last_error = String::new();
    for (network, size, result) in results {
        match result {
            Ok(batch_prices) => {
                debug!(source = source_name, %network, requested = size, priced = batch_prices.len(), "Batch loaded");
                prices.extend(batch_prices);
            }
            Err(e) => {
                warn!(source = source_name, %network, requested = size, error = %e, "Batch failed");
                failed += 1;
                last_error = e.to_string();
            }
        }
    }

    if failed == total {
        return Err(FeedError::AllBatchesFailed {
            source_name,
            batches: total,
            last_error,
        });
    }
    Ok(prices)
}

/// Build the shared HTTP client.
pub fn http_client(timeout: Duration) -> FeedResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FeedError::HttpClient(format!("Failed to create HTTP client: {e}")))
}

/// GET `url` and decode a JSON body, with an optional bearer token.
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    bearer: Option<&str>,
) -> FeedResult<T> {
    let mut request = client.get(url).header("accept", "application/json");
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    send_json(request).await
}

/// Send a prepared request and decode a JSON body from a 2xx response.
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> FeedResult<T> {
    let response = request
        .send()
        .await
        .map_err(|e| FeedError::HttpClient(format!("HTTP request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FeedError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| FeedError::Parse(format!("Failed to parse response: {e}")))
}
