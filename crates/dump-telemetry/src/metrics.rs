//! Prometheus metrics for the dump screener.
//!
//! Covers:
//! - Tick outcomes and duration
//! - Tracked and priced contract counts
//! - Snapshot history length
//! - Signals raised, by rule and direction
//! - Notification delivery
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_int_gauge, CounterVec, Encoder, Histogram,
    IntGauge, TextEncoder,
};

/// Total ticks by outcome.
/// Labels: outcome (completed/abandoned/skipped)
pub static TICKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dump_ticks_total",
        "Total detection ticks by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Tick duration in milliseconds (fetch included).
pub static TICK_DURATION_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "dump_tick_duration_ms",
        "Detection tick duration in milliseconds",
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0]
    )
    .unwrap()
});

/// Contracts requested on the last completed tick.
pub static TRACKED_CONTRACTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "dump_tracked_contracts",
        "Contracts requested on the last completed tick"
    )
    .unwrap()
});

/// Contracts priced on the last completed tick.
pub static PRICED_CONTRACTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "dump_priced_contracts",
        "Contracts priced on the last completed tick"
    )
    .unwrap()
});

/// Snapshots currently retained.
pub static HISTORY_LEN: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("dump_history_len", "Snapshots currently retained").unwrap()
});

/// Total signals raised.
/// Labels: rule (index), direction (drop/rise)
pub static SIGNALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dump_signals_total",
        "Total price move signals raised",
        &["rule", "direction"]
    )
    .unwrap()
});

/// Signals dropped before reaching a notifier.
/// Labels: reason (channel_full/channel_closed)
pub static SIGNALS_DROPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dump_signals_dropped_total",
        "Signals dropped before delivery",
        &["reason"]
    )
    .unwrap()
});

/// Notification attempts by notifier and result.
/// Labels: notifier, result (ok/error)
pub static NOTIFICATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dump_notifications_total",
        "Notification delivery attempts",
        &["notifier", "result"]
    )
    .unwrap()
});

/// Metrics helper for recording.
pub struct Metrics;

impl Metrics {
    /// Record a finished tick.
    pub fn tick_finished(outcome: &str, duration_ms: f64) {
        TICKS_TOTAL.with_label_values(&[outcome]).inc();
        TICK_DURATION_MS.observe(duration_ms);
    }

    /// Record contract coverage of a completed tick.
    pub fn coverage(tracked: usize, priced: usize) {
        TRACKED_CONTRACTS.set(tracked as i64);
        PRICED_CONTRACTS.set(priced as i64);
    }

    pub fn history_len(len: usize) {
        HISTORY_LEN.set(len as i64);
    }

    /// Record signal raised.
    pub fn signal_raised(rule_index: usize, direction: &str) {
        SIGNALS_TOTAL
            .with_label_values(&[&rule_index.to_string(), direction])
            .inc();
    }

    /// Record signal dropped at the sink.
    pub fn signal_dropped(reason: &str) {
        SIGNALS_DROPPED_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn notification_sent(notifier: &str) {
        NOTIFICATIONS_TOTAL.with_label_values(&[notifier, "ok"]).inc();
    }

    pub fn notification_failed(notifier: &str) {
        NOTIFICATIONS_TOTAL
            .with_label_values(&[notifier, "error"])
            .inc();
    }

    /// Render the default registry in Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
