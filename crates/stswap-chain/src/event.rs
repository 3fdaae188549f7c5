//! Provider-originated notifications.
//!
//! Instead of registering per-concern callbacks on the provider, the
//! session manager owns one channel of `ChainEvent`s and a single
//! consumer drains it sequentially. The provider side pushes into the
//! channel from its notification pump.

use alloy::primitives::Address;

/// A notification from the wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// The account list changed; the first entry is the active account.
    AccountsChanged(Vec<Address>),
    /// The provider switched networks.
    NetworkChanged(String),
    /// A new block was observed at the given height.
    NewBlock(u64),
}
