//! Error types for stswap-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Empty amount")]
    EmptyAmount,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Too many decimal places: {given} > {max}")]
    TooManyDecimals { given: usize, max: u32 },

    #[error("Amount overflows 256 bits: {0}")]
    AmountOverflow(String),
}

/// Result type alias for core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
