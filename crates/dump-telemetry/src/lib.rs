//! Prometheus metrics and structured logging for the dump screener.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus metrics for ticks, tracked contracts, signals and
//!   notification delivery

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, init_logging_with, DEFAULT_FILTER};
pub use metrics::Metrics;
