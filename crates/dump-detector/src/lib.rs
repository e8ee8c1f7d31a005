//! Time-windowed, multi-rule price dump detection.
//!
//! Keeps a bounded history of price snapshots sized from the longest
//! configured rule window, maps each rule's window onto that history,
//! and raises a signal whenever a contract's price moved at least the
//! rule's trigger percentage.
//!
//! One tick = fetch -> store -> evaluate -> emit, driven by
//! [`DumpDetectionEngine::run_tick`].

pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod rule;
pub mod signal;
pub mod snapshot;
pub mod source;

pub use config::{DedupPolicy, DetectorConfig};
pub use dedup::apply_dedup;
pub use engine::{DumpDetectionEngine, EngineState, EngineStatus, TickReport};
pub use error::{DetectorError, DetectorResult};
pub use evaluator::{PriceMove, RuleEvaluator};
pub use history::{lookback_steps, SharedHistory, SnapshotHistory};
pub use rule::{Rule, RuleDirection};
pub use signal::DumpSignal;
pub use snapshot::{PriceMap, PriceSnapshot};
pub use source::{
    BoxFuture, CexPriceMap, CexPriceSource, MockCexPriceSource, MockPriceSource, MockResponse,
    PriceSource, RecordingSink, SignalSink, StaticTokenRegistry, TokenRegistry,
};
