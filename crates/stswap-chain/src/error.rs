//! Error types for the chain boundary.

use thiserror::Error;

/// Errors crossing back from the wallet provider or a contract call.
///
/// Payloads are plain strings so the error is `Clone` and can be
/// carried into user-facing status messages unchanged.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// The wallet provider cannot be reached at all.
    #[error("Wallet unavailable: {0}")]
    Unavailable(String),

    /// The wallet declined a request (account access, signature).
    #[error("Request rejected by wallet: {0}")]
    Rejected(String),

    /// Signer configuration problem (bad key material).
    #[error("Invalid signer key: {0}")]
    InvalidKey(String),

    /// A provider or contract call failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The transaction was mined but reverted.
    #[error("Transaction reverted: {0}")]
    Reverted(String),
}

impl ChainError {
    /// Check whether the wallet declined the request.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, ChainError::Rejected(_))
    }

    /// Check whether the failure points at a stale signing nonce.
    ///
    /// Wallets whose local nonce has drifted from the chain produce
    /// errors mentioning the nonce; that case gets a targeted user
    /// message telling them to reset the wallet account.
    #[must_use]
    pub fn is_nonce_error(&self) -> bool {
        let message = match self {
            ChainError::Unavailable(m)
            | ChainError::Rejected(m)
            | ChainError::InvalidKey(m)
            | ChainError::Rpc(m)
            | ChainError::Reverted(m) => m,
        };
        message.to_ascii_lowercase().contains("nonce")
    }
}

/// Result type alias for chain operations.
pub type ChainResult<T> = std::result::Result<T, ChainError>;
