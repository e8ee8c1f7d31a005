//! Detection engine.
//!
//! Owns the snapshot history and drives one tick at a time:
//! fetch prices for the tracked set, append the snapshot, evaluate every
//! rule, de-duplicate, resolve token metadata, publish signals.
//!
//! A tick never fails outward. A failed or timed-out fetch abandons the
//! tick before anything is stored, so the history only ever holds
//! snapshots that were fully captured.

use crate::config::DetectorConfig;
use crate::dedup::apply_dedup;
use crate::error::{DetectorError, DetectorResult};
use crate::evaluator::RuleEvaluator;
use crate::history::{SharedHistory, SnapshotHistory};
use crate::signal::DumpSignal;
use crate::snapshot::{PriceMap, PriceSnapshot};
use crate::source::{PriceSource, SignalSink, TokenRegistry};
use chrono::{DateTime, Utc};
use dump_core::{ContractId, TokenView};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Running,
}

/// Engine counters, readable from outside the tick loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub state: EngineState,
    pub ticks_completed: u64,
    pub ticks_abandoned: u64,
    pub ticks_skipped: u64,
    pub signals_emitted: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self {
            state: EngineState::Idle,
            ticks_completed: 0,
            ticks_abandoned: 0,
            ticks_skipped: 0,
            signals_emitted: 0,
            last_tick_at: None,
        }
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickReport {
    /// Snapshot stored and rules evaluated.
    Completed {
        tracked: usize,
        priced: usize,
        signals: usize,
        /// Whether the append pushed the oldest snapshot out.
        evicted: bool,
        elapsed: Duration,
    },
    /// Fetch failed or timed out; history untouched.
    Abandoned { reason: String, elapsed: Duration },
    /// Nothing tracked, nothing fetched.
    Skipped,
}

impl TickReport {
    pub fn signals(&self) -> usize {
        match self {
            TickReport::Completed { signals, .. } => *signals,
            _ => 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            TickReport::Completed { elapsed, .. } | TickReport::Abandoned { elapsed, .. } => *elapsed,
            TickReport::Skipped => Duration::ZERO,
        }
    }

    /// Short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            TickReport::Completed { .. } => "completed",
            TickReport::Abandoned { .. } => "abandoned",
            TickReport::Skipped => "skipped",
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Time-windowed multi-rule dump detector.
///
/// `run_tick` takes `&mut self`, so ticks of one engine never overlap.
/// The history is shared behind [`SharedHistory`] for read-only
/// observers.
pub struct DumpDetectionEngine {
    config: DetectorConfig,
    evaluator: RuleEvaluator,
    history: SharedHistory,
    registry: Arc<dyn TokenRegistry>,
    source: Arc<dyn PriceSource>,
    sink: Arc<dyn SignalSink>,
    status: Arc<RwLock<EngineStatus>>,
}

impl DumpDetectionEngine {
    /// Build an engine with history sized for the longest rule window.
    pub fn new(
        config: DetectorConfig,
        registry: Arc<dyn TokenRegistry>,
        source: Arc<dyn PriceSource>,
        sink: Arc<dyn SignalSink>,
    ) -> DetectorResult<Self> {
        config.validate().map_err(DetectorError::ConfigError)?;

        let interval = config.sampling_interval();
        let history = SharedHistory::new(SnapshotHistory::for_rules(&config.rules, interval));

        info!(
            rules = config.rules.len(),
            interval_secs = config.sampling_interval_secs,
            history_capacity = history.capacity(),
            dedup = ?config.dedup,
            "DumpDetectionEngine initialized"
        );
        for (index, rule) in config.rules.iter().enumerate() {
            debug!(rule_index = index, rule = %rule, "Rule configured");
        }

        Ok(Self {
            evaluator: RuleEvaluator::new(interval),
            config,
            history,
            registry,
            source,
            sink,
            status: Arc::new(RwLock::new(EngineStatus::default())),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Shared handle to the snapshot history.
    pub fn history(&self) -> SharedHistory {
        self.history.clone()
    }

    pub fn status(&self) -> EngineStatus {
        self.status.read().clone()
    }

    /// Run one fetch -> store -> evaluate -> emit cycle.
    pub async fn run_tick(&mut self) -> TickReport {
        self.run_tick_at(Utc::now()).await
    }

    /// As [`run_tick`](Self::run_tick), with an explicit capture time.
    ///
    /// A capture time not after the latest stored snapshot is moved to
    /// one millisecond past it.
    pub async fn run_tick_at(&mut self, now: DateTime<Utc>) -> TickReport {
        let started = Instant::now();
        self.set_state(EngineState::Running);

        let report = self.tick(now, started).await;

        let mut status = self.status.write();
        status.state = EngineState::Idle;
        status.last_tick_at = Some(now);
        match &report {
            TickReport::Completed { signals, .. } => {
                status.ticks_completed += 1;
                status.signals_emitted += *signals as u64;
            }
            TickReport::Abandoned { .. } => status.ticks_abandoned += 1,
            TickReport::Skipped => status.ticks_skipped += 1,
        }
        drop(status);

        report
    }

    async fn tick(&self, now: DateTime<Utc>, started: Instant) -> TickReport {
        let tracked = self.registry.tracked_contracts();
        if tracked.is_empty() {
            warn!("No tracked contracts yet, skipping tick");
            return TickReport::Skipped;
        }
        let contracts: Vec<ContractId> = tracked.iter().cloned().collect();
        debug!(tracked = contracts.len(), "Tick started");

        let mut prices = match self.fetch(&contracts).await {
            Ok(prices) => prices,
            Err(e) => {
                error!(error = %e, tracked = contracts.len(), "Price fetch failed, abandoning tick");
                return TickReport::Abandoned {
                    reason: e.to_string(),
                    elapsed: started.elapsed(),
                };
            }
        };

        let returned = prices.len();
        prices.retain(|contract, _| tracked.contains(contract));
        if prices.len() < returned {
            debug!(
                dropped = returned - prices.len(),
                "Ignoring prices for untracked contracts"
            );
        }
        let priced = prices.len();
        if priced < contracts.len() {
            debug!(
                tracked = contracts.len(),
                priced,
                "Partial price result"
            );
        }

        let captured_at = self.capture_time(now);
        let evicted = match self.history.append(PriceSnapshot::new(captured_at, prices)) {
            Ok(evicted) => evicted.is_some(),
            Err(e) => {
                error!(error = %e, "Snapshot rejected, abandoning tick");
                return TickReport::Abandoned {
                    reason: e.to_string(),
                    elapsed: started.elapsed(),
                };
            }
        };

        let moves = self
            .history
            .with_read(|history| self.evaluator.evaluate_all(&self.config.rules, history));
        let moves = apply_dedup(moves, self.config.dedup);

        let signals = moves.len();
        for price_move in moves {
            let token = self.resolve_token(&price_move.contract);
            let signal = DumpSignal::from_move(price_move, token);
            info!(
                contract = %signal.contract,
                symbol = %signal.token.symbol,
                change_pct = %signal.change_percent,
                baseline = %signal.baseline_price,
                current = %signal.current_price,
                window_secs = signal.window.as_secs(),
                rule_index = signal.rule_index,
                "Price move detected"
            );
            self.sink.publish(signal);
        }

        let elapsed = started.elapsed();
        info!(
            tracked = contracts.len(),
            priced,
            signals,
            history_len = self.history.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Tick completed"
        );

        TickReport::Completed {
            tracked: contracts.len(),
            priced,
            signals,
            evicted,
            elapsed,
        }
    }

    async fn fetch(&self, contracts: &[ContractId]) -> DetectorResult<PriceMap> {
        let fetch = self.source.load_prices(contracts);
        match self.config.fetch_timeout() {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(result) => result,
                Err(_) => Err(DetectorError::FetchTimeout(limit.as_millis() as u64)),
            },
            None => fetch.await,
        }
    }

    fn capture_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.history.latest() {
            Some(latest) if now <= latest.captured_at() => {
                latest.captured_at() + chrono::Duration::milliseconds(1)
            }
            _ => now,
        }
    }

    fn resolve_token(&self, contract: &ContractId) -> TokenView {
        self.registry.resolve(contract).unwrap_or_else(|| {
            warn!(%contract, "Contract no longer in registry, using address as symbol");
            TokenView::unresolved(contract)
        })
    }

    fn set_state(&self, state: EngineState) {
        self.status.write().state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DedupPolicy;
    use crate::rule::Rule;
    use crate::source::{MockPriceSource, MockResponse, RecordingSink, StaticTokenRegistry};
    use chrono::TimeZone;
    use dump_core::{Network, Price};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn contract(n: u8) -> ContractId {
        ContractId::new(format!("0x{:040x}", n), Network::Ethereum)
    }

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + minute * 60, 0).unwrap()
    }

    fn prices(entries: &[(u8, Decimal)]) -> PriceMap {
        entries
            .iter()
            .map(|(n, p)| (contract(*n), Price::new(*p)))
            .collect()
    }

    struct Harness {
        engine: DumpDetectionEngine,
        registry: Arc<StaticTokenRegistry>,
        source: Arc<MockPriceSource>,
        sink: Arc<RecordingSink>,
    }

    fn harness(config: DetectorConfig) -> Harness {
        let registry = Arc::new(StaticTokenRegistry::new());
        registry.insert(TokenView::new("AAA", "Token A", vec![contract(1)]));
        registry.insert(TokenView::new("BBB", "Token B", vec![contract(2)]));
        let source = Arc::new(MockPriceSource::new());
        let sink = Arc::new(RecordingSink::new());
        let engine = DumpDetectionEngine::new(
            config,
            registry.clone(),
            source.clone(),
            sink.clone(),
        )
        .unwrap();
        Harness {
            engine,
            registry,
            source,
            sink,
        }
    }

    fn one_rule(pct: Decimal, window_secs: u64) -> DetectorConfig {
        DetectorConfig {
            rules: vec![Rule::new(pct, Duration::from_secs(window_secs))],
            ..Default::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = DumpDetectionEngine::new(
            DetectorConfig::default(),
            Arc::new(StaticTokenRegistry::new()),
            Arc::new(MockPriceSource::new()),
            Arc::new(RecordingSink::new()),
        );
        assert!(matches!(result, Err(DetectorError::ConfigError(_))));
    }

    #[test]
    fn test_history_sized_from_longest_window() {
        let config = DetectorConfig {
            rules: vec![
                Rule::new(dec!(10), Duration::from_secs(120)),
                Rule::new(dec!(10), Duration::from_secs(600)),
            ],
            ..Default::default()
        };
        let h = harness(config);
        assert_eq!(h.engine.history().capacity(), 11);
    }

    #[tokio::test]
    async fn test_first_tick_has_no_baseline() {
        let mut h = harness(one_rule(dec!(10), 60));
        h.source.push_prices(prices(&[(1, dec!(100)), (2, dec!(100))]));

        let report = h.engine.run_tick_at(at(0)).await;

        assert!(matches!(report, TickReport::Completed { priced: 2, signals: 0, .. }));
        assert_eq!(h.engine.history().len(), 1);
        assert!(h.sink.signals().is_empty());
    }

    #[tokio::test]
    async fn test_second_tick_emits_signal() {
        let mut h = harness(one_rule(dec!(30), 60));
        h.source.push_prices(prices(&[(1, dec!(100)), (2, dec!(100))]));
        h.source.push_prices(prices(&[(1, dec!(60)), (2, dec!(101))]));

        h.engine.run_tick_at(at(0)).await;
        let report = h.engine.run_tick_at(at(1)).await;

        assert_eq!(report.signals(), 1);
        let signals = h.sink.signals();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].contract, contract(1));
        assert_eq!(signals[0].token.symbol, "AAA");
        assert_eq!(signals[0].change_percent, dec!(-40.00));
        assert_eq!(signals[0].price_delta, Price::new(dec!(-40)));
        assert_eq!(signals[0].detected_at, at(1));

        let status = h.engine.status();
        assert_eq!(status.ticks_completed, 2);
        assert_eq!(status.signals_emitted, 1);
        assert_eq!(status.state, EngineState::Idle);
        assert_eq!(status.last_tick_at, Some(at(1)));
    }

    #[tokio::test]
    async fn test_skipped_when_nothing_tracked() {
        let mut h = harness(one_rule(dec!(10), 60));
        h.registry.remove(&contract(1));
        h.registry.remove(&contract(2));

        let report = h.engine.run_tick_at(at(0)).await;

        assert_eq!(report, TickReport::Skipped);
        assert!(h.source.requests().is_empty());
        assert_eq!(h.engine.status().ticks_skipped, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_history_untouched() {
        let mut h = harness(one_rule(dec!(10), 60));
        h.source.push_prices(prices(&[(1, dec!(100))]));
        h.source.push(MockResponse::Fail("upstream 503".to_string()));

        h.engine.run_tick_at(at(0)).await;
        let report = h.engine.run_tick_at(at(1)).await;

        match report {
            TickReport::Abandoned { reason, .. } => assert!(reason.contains("upstream 503")),
            other => panic!("expected abandoned tick, got {other:?}"),
        }
        assert_eq!(h.engine.history().len(), 1);
        assert_eq!(h.engine.status().ticks_abandoned, 1);
    }

    #[tokio::test]
    async fn test_fetch_timeout_abandons_tick() {
        let config = DetectorConfig {
            fetch_timeout_ms: Some(20),
            ..one_rule(dec!(10), 60)
        };
        let mut h = harness(config);
        h.source.push(MockResponse::Delayed(
            Duration::from_millis(500),
            prices(&[(1, dec!(100))]),
        ));

        let report = h.engine.run_tick_at(at(0)).await;

        assert_eq!(report.outcome(), "abandoned");
        assert!(h.engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_untracked_prices_dropped() {
        let mut h = harness(one_rule(dec!(10), 60));
        h.source.push_prices(prices(&[(1, dec!(100)), (9, dec!(5))]));

        let report = h.engine.run_tick_at(at(0)).await;

        assert!(matches!(report, TickReport::Completed { tracked: 2, priced: 1, .. }));
        let latest = h.engine.history().latest().unwrap();
        assert!(latest.price(&contract(9)).is_none());
    }

    #[tokio::test]
    async fn test_source_asked_for_tracked_set() {
        let mut h = harness(one_rule(dec!(10), 60));
        h.engine.run_tick_at(at(0)).await;
        assert_eq!(h.source.requests(), vec![vec![contract(1), contract(2)]]);
    }

    /// Tracks a contract but cannot describe it.
    struct ForgetfulRegistry;

    impl TokenRegistry for ForgetfulRegistry {
        fn tracked_contracts(&self) -> std::collections::BTreeSet<ContractId> {
            [contract(7)].into_iter().collect()
        }

        fn resolve(&self, _contract: &ContractId) -> Option<TokenView> {
            None
        }
    }

    #[tokio::test]
    async fn test_unresolved_token_falls_back_to_address() {
        let source = Arc::new(MockPriceSource::new());
        let sink = Arc::new(RecordingSink::new());
        let mut engine = DumpDetectionEngine::new(
            one_rule(dec!(10), 60),
            Arc::new(ForgetfulRegistry),
            source.clone(),
            sink.clone(),
        )
        .unwrap();
        source.push_prices(prices(&[(7, dec!(100))]));
        source.push_prices(prices(&[(7, dec!(200))]));

        engine.run_tick_at(at(0)).await;
        engine.run_tick_at(at(1)).await;

        let signals = sink.signals();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].token, TokenView::unresolved(&contract(7)));
        assert_eq!(signals[0].token.symbol, contract(7).address());
    }

    #[tokio::test]
    async fn test_dropped_contract_stops_signalling() {
        let mut h = harness(one_rule(dec!(10), 60));
        h.source.push_prices(prices(&[(1, dec!(100)), (2, dec!(100))]));
        h.source.push_prices(prices(&[(1, dec!(200)), (2, dec!(100))]));

        h.engine.run_tick_at(at(0)).await;
        h.registry.remove(&contract(1));
        h.engine.run_tick_at(at(1)).await;

        // the source still returned contract 1, but it is no longer tracked
        assert!(h.sink.signals().is_empty());
    }

    #[tokio::test]
    async fn test_capture_time_is_strictly_increasing() {
        let mut h = harness(one_rule(dec!(10), 60));
        h.source.push_prices(prices(&[(1, dec!(100))]));
        h.source.push_prices(prices(&[(1, dec!(100))]));

        h.engine.run_tick_at(at(5)).await;
        let report = h.engine.run_tick_at(at(5)).await;

        assert_eq!(report.outcome(), "completed");
        let snapshots = h.engine.history().snapshots();
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots[1].captured_at() > snapshots[0].captured_at());
    }

    #[tokio::test]
    async fn test_per_contract_dedup() {
        let config = DetectorConfig {
            rules: vec![
                Rule::new(dec!(10), Duration::from_secs(60)),
                Rule::new(dec!(10), Duration::from_secs(120)),
            ],
            dedup: DedupPolicy::PerContract,
            ..Default::default()
        };
        let mut h = harness(config);
        h.source.push_prices(prices(&[(1, dec!(100))]));
        h.source.push_prices(prices(&[(1, dec!(80))]));
        h.source.push_prices(prices(&[(1, dec!(60))]));

        for minute in 0..3 {
            h.engine.run_tick_at(at(minute)).await;
        }

        let signals = h.sink.take();
        assert_eq!(signals.len(), 2);
        // minute 1: both rules compare against minute 0 (-20%), earliest
        // rule wins the tie
        assert_eq!(signals[0].rule_index, 0);
        assert_eq!(signals[0].change_percent, dec!(-20));
        // minute 2: rule 1 (-40%) beats rule 0 (-25%)
        assert_eq!(signals[1].rule_index, 1);
        assert_eq!(signals[1].change_percent, dec!(-40));
    }
}
