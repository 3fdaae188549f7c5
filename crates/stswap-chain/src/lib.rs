//! Chain boundary for the stswap client.
//!
//! Everything that crosses over to the wallet provider or to a deployed
//! contract goes through the traits in this crate:
//! - `WalletProvider`: account access, network identity, contract
//!   handle construction, event feed registration
//! - `TokenContract` / `SwapContract` / `DelegateApprovals`: the three
//!   contract interfaces the workflow orchestrates
//! - `TxHandle`: a submitted transaction, awaitable for confirmation
//!
//! `rpc` provides the JSON-RPC implementations over a local-key signer;
//! `mock` provides recording fakes for session and purchase-flow tests.

pub mod boundary;
pub mod error;
pub mod event;
pub mod mock;
pub mod rpc;

pub use boundary::{
    BoxFuture, DelegateApprovals, DynTxHandle, DynWalletProvider, SwapContract, TokenContract,
    TxHandle, WalletProvider,
};
pub use error::{ChainError, ChainResult};
pub use event::ChainEvent;
pub use rpc::{connect_http, network_name_for_chain, RpcWalletProvider};
