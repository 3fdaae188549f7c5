//! User-facing purchase status messages.

use alloy::primitives::B256;
use stswap_chain::ChainError;

/// One status message per purchase phase.
///
/// The `Display` impl is the exact text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// Spend amount exceeds the tracked balance.
    InsufficientBalance,
    /// Spend amount is zero.
    NonPositiveAmount,
    /// A purchase is already in flight; this one was rejected.
    PurchaseInFlight,
    /// Spending approval requested from the wallet.
    ApprovingSpend,
    /// Delegated-trading approval requested from the wallet.
    DelegateApprovalRequested,
    /// Swap accepted; awaiting on-chain confirmation.
    SwapPending { tx_hash: B256 },
    /// Swap confirmed on chain.
    SwapConfirmed { tx_hash: B256 },
    /// The purchase aborted; the message is already user-ready.
    Failed { message: String },
}

impl std::fmt::Display for StatusUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientBalance => write!(f, "insufficient balance"),
            Self::NonPositiveAmount => write!(f, "must spend a positive amount"),
            Self::PurchaseInFlight => write!(f, "a purchase is already in progress"),
            Self::ApprovingSpend => write!(f, "requesting spending approval..."),
            Self::DelegateApprovalRequested => {
                write!(f, "requesting delegated trading approval...")
            }
            Self::SwapPending { tx_hash } => write!(f, "swap transaction {tx_hash} pending..."),
            Self::SwapConfirmed { tx_hash } => write!(f, "swap confirmed in transaction {tx_hash}"),
            Self::Failed { message } => write!(f, "{message}"),
        }
    }
}

/// Build the user-facing text for a failed chain call.
///
/// Stale-nonce failures get a targeted hint; wallet rejections and
/// generic failures get their own phrasings.
#[must_use]
pub fn failure_message(error: &ChainError) -> String {
    if error.is_nonce_error() {
        "transaction failed - try resetting your wallet account".to_string()
    } else if error.is_rejected() {
        format!("request rejected: {error}")
    } else {
        format!("transaction failed: {error}")
    }
}
