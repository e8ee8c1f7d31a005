//! Dump screener application.
//!
//! Wires the token catalog, price source, detection engine and
//! notifiers together and drives the engine on a fixed-delay schedule:
//! - Configuration loading (TOML)
//! - Tick loop with graceful Ctrl-C shutdown
//! - Notifier task fed through a bounded channel

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, RunSummary};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
