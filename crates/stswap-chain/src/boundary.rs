//! Boundary traits for the wallet provider and the deployed contracts.
//!
//! The traits are dyn-compatible so the session and purchase flow can
//! hold `Arc<dyn …>` handles and tests can substitute recording fakes.
//! Async methods return a boxed future instead of using async-fn-in-
//! trait, which would not be object safe.

use crate::error::ChainResult;
use crate::event::ChainEvent;
use alloy::primitives::{Address, B256, U256};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// A transaction accepted by the wallet and broadcast to the chain.
///
/// The handle exposes the transaction hash immediately; awaiting
/// `confirmed` blocks until the transaction is mined and reports a
/// revert as an error.
pub trait TxHandle: Send {
    /// Hash of the broadcast transaction.
    fn tx_hash(&self) -> B256;

    /// Wait for on-chain confirmation.
    fn confirmed(self: Box<Self>) -> BoxFuture<'static, ChainResult<()>>;
}

/// Boxed transaction handle.
pub type DynTxHandle = Box<dyn TxHandle>;

/// ERC-20 token interface, scoped to what the workflow needs.
pub trait TokenContract: Send + Sync {
    /// Scale decimals of the token.
    fn decimals(&self) -> BoxFuture<'_, ChainResult<u8>>;

    /// Raw balance of `owner`.
    fn balance_of(&self, owner: Address) -> BoxFuture<'_, ChainResult<U256>>;

    /// Amount `owner` has authorized `spender` to transfer.
    fn allowance(&self, owner: Address, spender: Address) -> BoxFuture<'_, ChainResult<U256>>;

    /// Authorize `spender` to transfer up to `amount`.
    fn approve(&self, spender: Address, amount: U256) -> BoxFuture<'_, ChainResult<DynTxHandle>>;
}

/// The swap contract: suspension flag, return estimation, execution.
pub trait SwapContract: Send + Sync {
    /// Deployed address, which is the spender the ERC-20 approval targets.
    fn address(&self) -> Address;

    /// Whether the synthetic asset's trading venue is suspended.
    /// The market-open flag is the inverse of this.
    fn suspended(&self) -> BoxFuture<'_, ChainResult<bool>>;

    /// Estimate the target-currency return for a spend amount.
    fn estimate_swap(
        &self,
        amount: U256,
        use_delegation: bool,
    ) -> BoxFuture<'_, ChainResult<U256>>;

    /// Execute the swap.
    fn swap(&self, amount: U256, use_delegation: bool) -> BoxFuture<'_, ChainResult<DynTxHandle>>;
}

/// The delegated-trading approval registry.
pub trait DelegateApprovals: Send + Sync {
    /// Whether `delegate` may already exchange on behalf of `account`.
    fn can_exchange_for(
        &self,
        account: Address,
        delegate: Address,
    ) -> BoxFuture<'_, ChainResult<bool>>;

    /// Grant `delegate` permission to exchange on the caller's behalf.
    fn approve_exchange_on_behalf(
        &self,
        delegate: Address,
    ) -> BoxFuture<'_, ChainResult<DynTxHandle>>;
}

/// The wallet provider: account access, network identity, contract
/// handle construction and the notification feed.
pub trait WalletProvider: Send + Sync {
    /// Request account access. An empty list means the wallet granted
    /// nothing; the caller treats that as a declined connection.
    fn request_accounts(&self) -> BoxFuture<'_, ChainResult<Vec<Address>>>;

    /// Identifier of the active network.
    fn network_name(&self) -> BoxFuture<'_, ChainResult<String>>;

    /// Construct a token contract handle at `address`.
    fn token_contract(&self, address: Address) -> Arc<dyn TokenContract>;

    /// Construct a swap contract handle at `address`.
    fn swap_contract(&self, address: Address) -> Arc<dyn SwapContract>;

    /// Construct a delegate-approval registry handle at `address`.
    fn delegate_contract(&self, address: Address) -> Arc<dyn DelegateApprovals>;

    /// Start pushing provider notifications into `events`.
    ///
    /// Callers register the feed at most once per process; the pump
    /// runs until the receiving side is dropped.
    fn start_event_feed(&self, events: mpsc::Sender<ChainEvent>) -> ChainResult<()>;
}

/// Shared wallet provider handle.
pub type DynWalletProvider = Arc<dyn WalletProvider>;
