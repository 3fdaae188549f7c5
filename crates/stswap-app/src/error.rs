//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chain error: {0}")]
    Chain(#[from] stswap_chain::ChainError),

    #[error("Session error: {0}")]
    Session(#[from] stswap_session::SessionError),

    #[error("Amount error: {0}")]
    Amount(#[from] stswap_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
