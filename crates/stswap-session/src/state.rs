//! Session state types.

use alloy::primitives::Address;
use std::sync::Arc;
use stswap_chain::{DelegateApprovals, SwapContract, TokenContract};
use stswap_registry::AddressSet;

/// Wallet connection state.
///
/// Closed variant set, matched exhaustively at every consumption site.
/// `Connecting` is only reachable from `Disconnected`, and `Connected`
/// only from `Connecting`; the manager is the sole mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletState {
    /// No session; the connect action is available.
    Disconnected,
    /// Connection setup in flight; connect actions are no-ops.
    Connecting,
    /// A fully constructed session exists.
    Connected,
}

impl std::fmt::Display for WalletState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Resolved addresses plus live contract handles for one network.
///
/// Immutable once constructed; a network change replaces the whole set.
#[derive(Clone)]
pub struct ContractHandles {
    /// The resolved address set.
    pub addresses: AddressSet,
    /// Spend currency token (USDC).
    pub spend_token: Arc<dyn TokenContract>,
    /// Target currency token (sTSLA).
    pub target_token: Arc<dyn TokenContract>,
    /// The swap contract.
    pub swap: Arc<dyn SwapContract>,
    /// The delegated-trading approval registry.
    pub delegates: Arc<dyn DelegateApprovals>,
    /// Scale decimals of the spend token.
    pub spend_decimals: u8,
    /// Scale decimals of the target token.
    pub target_decimals: u8,
}

/// A fully established wallet session.
///
/// Either entirely present (all handles constructed, decimals fetched)
/// or absent; never partially populated. Owned by the session manager,
/// handed to other components as a read-only snapshot.
#[derive(Clone)]
pub struct ActiveSession {
    /// The active account.
    pub account: Address,
    /// Provider-reported network identifier.
    pub network: String,
    /// Contract handles for that network.
    pub contracts: ContractHandles,
}
