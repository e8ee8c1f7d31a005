//! Token catalog for the dump screener.
//!
//! Holds token metadata keyed by contract and answers the two questions
//! the detection engine asks every tick: which contracts to price, and
//! what token a contract belongs to. The whole catalog can be swapped
//! atomically when metadata is refreshed.

pub mod catalog;
pub mod error;

pub use catalog::{CatalogState, TokenCatalog};
pub use error::{RegistryError, RegistryResult};
