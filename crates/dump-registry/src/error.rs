//! Registry error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid token entry: {0}")]
    InvalidToken(String),

    #[error("Contract {contract} claimed by both {first} and {second}")]
    DuplicateContract {
        contract: String,
        first: String,
        second: String,
    },
}

pub type RegistryResult<T> = Result<T, RegistryError>;
