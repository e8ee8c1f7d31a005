//! Core domain types for the dump screener.
//!
//! This crate provides fundamental types used throughout the screener:
//! - `ContractId`: Unique identifier for a token contract (address + network)
//! - `Price`: Precision-safe USD price
//! - `TokenView`: Display metadata for a tracked token
//! - `Exchange` / `TradePair`: Centralized exchange listings
//! - Percentage helpers with controlled rounding

pub mod contract;
pub mod decimal;
pub mod error;
pub mod exchange;
pub mod token;

pub use contract::{ContractId, Network};
pub use decimal::{round_percent, spread_pct, Price, PERCENT_SCALE};
pub use error::{CoreError, Result};
pub use exchange::{Exchange, TradePair};
pub use token::{LiquidityPool, TokenView};
