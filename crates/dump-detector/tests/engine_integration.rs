//! Multi-tick engine scenarios.
//!
//! Drives the engine through scripted price sequences:
//! - Warm-up, detection and history eviction
//! - Abandoned ticks in the middle of a run
//! - Registry changes between ticks

use chrono::{DateTime, TimeZone, Utc};
use dump_core::{ContractId, Network, Price, TokenView};
use dump_detector::source::{MockPriceSource, MockResponse, RecordingSink, StaticTokenRegistry};
use dump_detector::{DetectorConfig, DumpDetectionEngine, PriceMap, Rule, RuleDirection, TickReport};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

fn pepe() -> ContractId {
    ContractId::new("0x6982508145454Ce325dDbE47a25d4ec3d2311933", Network::Ethereum)
}

fn wif() -> ContractId {
    ContractId::new("0x25d887ce7a35172c62febfd67a1856f20faebb00", Network::Arbitrum)
}

fn at(minute: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + minute * 60, 0).unwrap()
}

fn prices(pepe_price: Option<Decimal>, wif_price: Option<Decimal>) -> PriceMap {
    let mut map = PriceMap::new();
    if let Some(p) = pepe_price {
        map.insert(pepe(), Price::new(p));
    }
    if let Some(p) = wif_price {
        map.insert(wif(), Price::new(p));
    }
    map
}

fn setup(rules: Vec<Rule>) -> (DumpDetectionEngine, Arc<StaticTokenRegistry>, Arc<MockPriceSource>, Arc<RecordingSink>) {
    let registry = Arc::new(StaticTokenRegistry::new());
    registry.insert(TokenView::new("PEPE", "Pepe", vec![pepe()]));
    registry.insert(TokenView::new("WIF", "dogwifhat", vec![wif()]));
    let source = Arc::new(MockPriceSource::new());
    let sink = Arc::new(RecordingSink::new());

    let config = DetectorConfig {
        sampling_interval_secs: 60,
        rules,
        ..Default::default()
    };
    let engine = DumpDetectionEngine::new(config, registry.clone(), source.clone(), sink.clone())
        .expect("valid config");
    (engine, registry, source, sink)
}

#[tokio::test]
async fn test_slow_dump_caught_by_long_window_only() {
    // 5-minute slide of 8% per minute: never 10% in one minute, well over
    // 30% across five.
    let (mut engine, _registry, source, sink) = setup(vec![
        Rule::new(dec!(10), Duration::from_secs(60)),
        Rule::new(dec!(30), Duration::from_secs(300)).with_direction(RuleDirection::Drop),
    ]);

    let path = [dec!(1.00), dec!(0.92), dec!(0.85), dec!(0.78), dec!(0.72), dec!(0.66)];
    for (minute, p) in path.iter().enumerate() {
        source.push_prices(prices(Some(*p), Some(dec!(2.5))));
        engine.run_tick_at(at(minute as i64)).await;
    }

    let signals = sink.signals();
    assert!(!signals.is_empty());
    assert!(signals.iter().all(|s| s.rule_index == 1));
    assert!(signals.iter().all(|s| s.contract == pepe()));

    // final tick compares against minute 0: 1.00 -> 0.66
    let last = signals.last().unwrap();
    assert_eq!(last.baseline_price, Price::new(dec!(1.00)));
    assert_eq!(last.change_percent, dec!(-34.00));
    assert_eq!(last.window, Duration::from_secs(300));
    assert_eq!(last.token.symbol, "PEPE");
}

#[tokio::test]
async fn test_history_stays_bounded() {
    let (mut engine, _registry, source, _sink) =
        setup(vec![Rule::new(dec!(50), Duration::from_secs(180))]);
    let history = engine.history();
    assert_eq!(history.capacity(), 4);

    let mut evictions = 0;
    for minute in 0..10 {
        source.push_prices(prices(Some(dec!(1)), Some(dec!(1))));
        if let TickReport::Completed { evicted, .. } = engine.run_tick_at(at(minute)).await {
            evictions += usize::from(evicted);
        }
        assert!(history.len() <= 4);
    }

    assert_eq!(history.len(), 4);
    assert_eq!(evictions, 6);
    let snapshots = history.snapshots();
    assert_eq!(snapshots[0].captured_at(), at(6));
    assert_eq!(snapshots[3].captured_at(), at(9));
}

#[tokio::test]
async fn test_abandoned_tick_does_not_shift_baseline() {
    let (mut engine, _registry, source, sink) =
        setup(vec![Rule::new(dec!(20), Duration::from_secs(60))]);

    source.push_prices(prices(Some(dec!(100)), None));
    source.push(MockResponse::Fail("rate limited".to_string()));
    source.push_prices(prices(Some(dec!(70)), None));

    assert_eq!(engine.run_tick_at(at(0)).await.outcome(), "completed");
    assert_eq!(engine.run_tick_at(at(1)).await.outcome(), "abandoned");
    let report = engine.run_tick_at(at(2)).await;

    // minute 1 was never stored, so minute 2 compares with minute 0
    assert_eq!(report.signals(), 1);
    assert_eq!(sink.signals()[0].change_percent, dec!(-30));
    assert_eq!(engine.history().len(), 2);

    let status = engine.status();
    assert_eq!(status.ticks_completed, 2);
    assert_eq!(status.ticks_abandoned, 1);
}

#[tokio::test]
async fn test_partial_prices_only_compare_present_contracts() {
    let (mut engine, _registry, source, sink) =
        setup(vec![Rule::new(dec!(10), Duration::from_secs(60))]);

    source.push_prices(prices(Some(dec!(1)), Some(dec!(4))));
    source.push_prices(prices(None, Some(dec!(2))));
    source.push_prices(prices(Some(dec!(0.5)), Some(dec!(2))));

    engine.run_tick_at(at(0)).await;
    let second = engine.run_tick_at(at(1)).await;
    assert!(matches!(second, TickReport::Completed { tracked: 2, priced: 1, signals: 1, .. }));
    let third = engine.run_tick_at(at(2)).await;
    // PEPE absent from the baseline at minute 1, WIF flat
    assert_eq!(third.signals(), 0);

    let signals = sink.signals();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].contract, wif());
    assert_eq!(signals[0].change_percent, dec!(-50));
}

#[tokio::test]
async fn test_new_contract_joins_mid_run() {
    let (mut engine, registry, source, sink) =
        setup(vec![Rule::new(dec!(10), Duration::from_secs(60))]);
    let newcomer = ContractId::new("0x00000000000000000000000000000000000000aa", Network::Base);

    source.push_prices(prices(Some(dec!(1)), Some(dec!(1))));
    engine.run_tick_at(at(0)).await;

    registry.insert(TokenView::new("NEW", "Newcomer", vec![newcomer.clone()]));
    let mut with_newcomer = prices(Some(dec!(1)), Some(dec!(1)));
    with_newcomer.insert(newcomer.clone(), Price::new(dec!(10)));
    source.push_prices(with_newcomer);
    engine.run_tick_at(at(1)).await;

    let mut dumped = prices(Some(dec!(1)), Some(dec!(1)));
    dumped.insert(newcomer.clone(), Price::new(dec!(1)));
    source.push_prices(dumped);
    engine.run_tick_at(at(2)).await;

    let signals = sink.signals();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].contract, newcomer);
    assert_eq!(signals[0].token.symbol, "NEW");
    assert_eq!(signals[0].change_percent, dec!(-90));
    assert_eq!(source.requests()[1].len(), 3);
}
