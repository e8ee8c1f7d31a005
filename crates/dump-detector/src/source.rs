//! Collaborator seams of the detection engine.
//!
//! The engine talks to the outside world through three traits:
//! - [`PriceSource`] fetches current USD prices for a set of contracts
//! - [`TokenRegistry`] lists tracked contracts and resolves metadata
//! - [`SignalSink`] receives emitted signals
//!
//! [`CexPriceSource`] quotes centralized exchange prices for signals
//! after they leave the engine.
//!
//! In-memory implementations are provided for wiring tests.

use crate::error::{DetectorError, DetectorResult};
use crate::signal::DumpSignal;
use crate::snapshot::PriceMap;
use dump_core::{ContractId, Exchange, Price, TokenView};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::pin::Pin;
use std::time::Duration;

/// Boxed future type for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

// ============================================================================
// Traits
// ============================================================================

/// Fetches current prices.
pub trait PriceSource: Send + Sync {
    /// Load prices for `contracts`.
    ///
    /// Partial results are fine: contracts the source could not price are
    /// simply absent from the map. An `Err` means nothing usable came
    /// back and the tick is abandoned.
    fn load_prices<'a>(&'a self, contracts: &'a [ContractId]) -> BoxFuture<'a, DetectorResult<PriceMap>>;
}

/// Source of the tracked contract set and token metadata.
pub trait TokenRegistry: Send + Sync {
    /// Contracts to price on the next tick. May change between ticks.
    fn tracked_contracts(&self) -> BTreeSet<ContractId>;

    /// Metadata for a contract, `None` if it is no longer known.
    fn resolve(&self, contract: &ContractId) -> Option<TokenView>;
}

/// USD price per exchange.
pub type CexPriceMap = BTreeMap<Exchange, Price>;

/// Fetches a token's price on centralized exchanges.
pub trait CexPriceSource: Send + Sync {
    /// Quote `token` on each of `exchanges` it has a trade pair for.
    ///
    /// Exchanges that fail or have no pair are absent from the map.
    fn dollar_prices<'a>(
        &'a self,
        token: &'a TokenView,
        exchanges: &'a [Exchange],
    ) -> BoxFuture<'a, DetectorResult<CexPriceMap>>;
}

/// Receives signals emitted by the engine.
///
/// Must not block the tick; slow consumers should queue internally.
pub trait SignalSink: Send + Sync {
    fn publish(&self, signal: DumpSignal);
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// Scripted response for [`MockPriceSource`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    Prices(PriceMap),
    Fail(String),
    /// Sleep before answering with the prices.
    Delayed(Duration, PriceMap),
}

/// Price source replaying a script of responses, one per call.
///
/// An exhausted script answers with an empty map. Requested contract
/// lists are recorded for verification.
#[derive(Debug, Default)]
pub struct MockPriceSource {
    script: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<Vec<ContractId>>>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: MockResponse) {
        self.script.lock().push_back(response);
    }

    pub fn push_prices(&self, prices: PriceMap) {
        self.push(MockResponse::Prices(prices));
    }

    /// Contract lists passed to each `load_prices` call, in call order.
    pub fn requests(&self) -> Vec<Vec<ContractId>> {
        self.requests.lock().clone()
    }
}

impl PriceSource for MockPriceSource {
    fn load_prices<'a>(&'a self, contracts: &'a [ContractId]) -> BoxFuture<'a, DetectorResult<PriceMap>> {
        Box::pin(async move {
            self.requests.lock().push(contracts.to_vec());
            let next = self.script.lock().pop_front();
            match next {
                Some(MockResponse::Prices(prices)) => Ok(prices),
                Some(MockResponse::Fail(reason)) => Err(DetectorError::FetchFailed(reason)),
                Some(MockResponse::Delayed(delay, prices)) => {
                    tokio::time::sleep(delay).await;
                    Ok(prices)
                }
                None => Ok(PriceMap::new()),
            }
        })
    }
}

/// CEX source answering from a fixed symbol -> prices table.
///
/// Unknown symbols fail. Queried symbols are recorded.
#[derive(Debug, Default)]
pub struct MockCexPriceSource {
    prices: Mutex<HashMap<String, CexPriceMap>>,
    queries: Mutex<Vec<String>>,
}

impl MockCexPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, symbol: impl Into<String>, prices: CexPriceMap) {
        self.prices.lock().insert(symbol.into(), prices);
    }

    /// Token symbols passed to each `dollar_prices` call.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

impl CexPriceSource for MockCexPriceSource {
    fn dollar_prices<'a>(
        &'a self,
        token: &'a TokenView,
        exchanges: &'a [Exchange],
    ) -> BoxFuture<'a, DetectorResult<CexPriceMap>> {
        Box::pin(async move {
            self.queries.lock().push(token.symbol.clone());
            let prices = self
                .prices
                .lock()
                .get(&token.symbol)
                .cloned()
                .ok_or_else(|| DetectorError::FetchFailed(format!("no CEX quote for {}", token.symbol)))?;
            Ok(prices
                .into_iter()
                .filter(|(exchange, _)| exchanges.contains(exchange))
                .collect())
        })
    }
}

/// Registry backed by a mutable map.
#[derive(Debug, Default)]
pub struct StaticTokenRegistry {
    tokens: Mutex<HashMap<ContractId, TokenView>>,
}

impl StaticTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track every contract of `token`.
    pub fn insert(&self, token: TokenView) {
        let mut tokens = self.tokens.lock();
        for contract in &token.contracts {
            tokens.insert(contract.clone(), token.clone());
        }
    }

    pub fn remove(&self, contract: &ContractId) -> Option<TokenView> {
        self.tokens.lock().remove(contract)
    }
}

impl TokenRegistry for StaticTokenRegistry {
    fn tracked_contracts(&self) -> BTreeSet<ContractId> {
        self.tokens.lock().keys().cloned().collect()
    }

    fn resolve(&self, contract: &ContractId) -> Option<TokenView> {
        self.tokens.lock().get(contract).cloned()
    }
}

/// Sink collecting every published signal.
#[derive(Debug, Default)]
pub struct RecordingSink {
    signals: Mutex<Vec<DumpSignal>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<DumpSignal> {
        self.signals.lock().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<DumpSignal> {
        std::mem::take(&mut *self.signals.lock())
    }
}

impl SignalSink for RecordingSink {
    fn publish(&self, signal: DumpSignal) {
        self.signals.lock().push(signal);
    }
}
