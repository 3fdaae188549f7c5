//! Error types for session management.

use stswap_chain::ChainError;
use thiserror::Error;

/// Connection and session failures, one variant per user-facing case.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No wallet provider can be reached.
    #[error("No wallet available: {0}")]
    WalletUnavailable(String),

    /// The wallet declined the connection or granted no account.
    #[error("Wallet connection rejected: {0}")]
    ConnectionRejected(String),

    /// The active network has no configured contract addresses. The
    /// payload is the human-friendly network name.
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// Contract handle construction or metadata fetch failed.
    #[error("Session setup failed: {0}")]
    Setup(#[from] ChainError),
}

/// Result type alias for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;
