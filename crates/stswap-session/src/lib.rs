//! Wallet session lifecycle for the stswap client.
//!
//! `SessionManager` owns the connection state machine: it negotiates
//! account access with the wallet provider, resolves the contract
//! address set for the active network, constructs the contract handles,
//! and reacts to provider notifications. `BalanceTracker` keeps the
//! displayed balances and the market-open flag synchronized with new
//! blocks.

pub mod error;
pub mod manager;
pub mod state;
pub mod tracker;

pub use error::{SessionError, SessionResult};
pub use manager::SessionManager;
pub use state::{ActiveSession, ContractHandles, WalletState};
pub use tracker::{BalanceSnapshot, BalanceTracker};
