//! Recording fakes for the chain boundary.
//!
//! Used by session and purchase-flow tests across the workspace, so
//! they live in the crate proper rather than behind `cfg(test)`. Every
//! mock records the calls it receives and can be armed with a failure
//! for the next call.

use crate::boundary::{
    BoxFuture, DelegateApprovals, DynTxHandle, SwapContract, TokenContract, TxHandle,
    WalletProvider,
};
use crate::error::{ChainError, ChainResult};
use crate::event::ChainEvent;
use alloy::primitives::{Address, B256, U256};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Notify;

fn hash_from_counter(counter: &AtomicU64) -> B256 {
    B256::from(U256::from(counter.fetch_add(1, Ordering::AcqRel) + 1))
}

/// Transaction handle that confirms immediately, optionally waiting on
/// a gate first (to hold a purchase in flight during a test).
pub struct MockTxHandle {
    hash: B256,
    result: ChainResult<()>,
    gate: Option<Arc<Notify>>,
}

impl MockTxHandle {
    /// A handle that confirms successfully.
    #[must_use]
    pub fn ok(hash: B256) -> Self {
        Self {
            hash,
            result: Ok(()),
            gate: None,
        }
    }

    /// A handle whose confirmation wait fails.
    #[must_use]
    pub fn failing(hash: B256, error: ChainError) -> Self {
        Self {
            hash,
            result: Err(error),
            gate: None,
        }
    }
}

impl TxHandle for MockTxHandle {
    fn tx_hash(&self) -> B256 {
        self.hash
    }

    fn confirmed(self: Box<Self>) -> BoxFuture<'static, ChainResult<()>> {
        Box::pin(async move {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.result
        })
    }
}

/// Recording ERC-20 fake.
pub struct MockToken {
    decimals: u8,
    balances: Mutex<HashMap<Address, U256>>,
    allowances: Mutex<HashMap<(Address, Address), U256>>,
    approve_calls: Mutex<Vec<(Address, U256)>>,
    next_approve_error: Mutex<Option<ChainError>>,
    next_read_error: Mutex<Option<ChainError>>,
    hashes: AtomicU64,
}

impl MockToken {
    /// Create a token with the given scale decimals.
    #[must_use]
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals,
            balances: Mutex::new(HashMap::new()),
            allowances: Mutex::new(HashMap::new()),
            approve_calls: Mutex::new(Vec::new()),
            next_approve_error: Mutex::new(None),
            next_read_error: Mutex::new(None),
            hashes: AtomicU64::new(0),
        }
    }

    /// Set the balance of `owner`.
    pub fn set_balance(&self, owner: Address, amount: U256) {
        self.balances.lock().insert(owner, amount);
    }

    /// Set the allowance `owner` has granted `spender`.
    pub fn set_allowance(&self, owner: Address, spender: Address, amount: U256) {
        self.allowances.lock().insert((owner, spender), amount);
    }

    /// Fail the next `approve` call with `error`.
    pub fn fail_next_approve(&self, error: ChainError) {
        *self.next_approve_error.lock() = Some(error);
    }

    /// Fail the next read (`decimals`/`balance_of`/`allowance`).
    pub fn fail_next_read(&self, error: ChainError) {
        *self.next_read_error.lock() = Some(error);
    }

    /// Recorded `approve` calls as `(spender, amount)`.
    #[must_use]
    pub fn approve_calls(&self) -> Vec<(Address, U256)> {
        self.approve_calls.lock().clone()
    }
}

impl TokenContract for MockToken {
    fn decimals(&self) -> BoxFuture<'_, ChainResult<u8>> {
        Box::pin(async move {
            if let Some(error) = self.next_read_error.lock().take() {
                return Err(error);
            }
            Ok(self.decimals)
        })
    }

    fn balance_of(&self, owner: Address) -> BoxFuture<'_, ChainResult<U256>> {
        Box::pin(async move {
            if let Some(error) = self.next_read_error.lock().take() {
                return Err(error);
            }
            Ok(self.balances.lock().get(&owner).copied().unwrap_or_default())
        })
    }

    fn allowance(&self, owner: Address, spender: Address) -> BoxFuture<'_, ChainResult<U256>> {
        Box::pin(async move {
            if let Some(error) = self.next_read_error.lock().take() {
                return Err(error);
            }
            Ok(self
                .allowances
                .lock()
                .get(&(owner, spender))
                .copied()
                .unwrap_or_default())
        })
    }

    fn approve(&self, spender: Address, amount: U256) -> BoxFuture<'_, ChainResult<DynTxHandle>> {
        Box::pin(async move {
            self.approve_calls.lock().push((spender, amount));
            if let Some(error) = self.next_approve_error.lock().take() {
                return Err(error);
            }
            let handle: DynTxHandle = Box::new(MockTxHandle::ok(hash_from_counter(&self.hashes)));
            Ok(handle)
        })
    }
}

/// Recording swap-contract fake.
pub struct MockSwap {
    address: Address,
    suspended: Mutex<bool>,
    estimate: Mutex<ChainResult<U256>>,
    estimate_calls: Mutex<Vec<(U256, bool)>>,
    swap_calls: Mutex<Vec<(U256, bool)>>,
    next_swap_error: Mutex<Option<ChainError>>,
    next_suspended_error: Mutex<Option<ChainError>>,
    confirm_result: Mutex<ChainResult<()>>,
    confirm_gate: Mutex<Option<Arc<Notify>>>,
    hashes: AtomicU64,
}

impl MockSwap {
    /// Create a swap contract fake at `address`, market open.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            suspended: Mutex::new(false),
            estimate: Mutex::new(Ok(U256::ZERO)),
            estimate_calls: Mutex::new(Vec::new()),
            swap_calls: Mutex::new(Vec::new()),
            next_swap_error: Mutex::new(None),
            next_suspended_error: Mutex::new(None),
            confirm_result: Mutex::new(Ok(())),
            confirm_gate: Mutex::new(None),
            hashes: AtomicU64::new(0),
        }
    }

    /// Set the suspension flag.
    pub fn set_suspended(&self, suspended: bool) {
        *self.suspended.lock() = suspended;
    }

    /// Set the estimation outcome.
    pub fn set_estimate(&self, result: ChainResult<U256>) {
        *self.estimate.lock() = result;
    }

    /// Fail the next `swap` submission.
    pub fn fail_next_swap(&self, error: ChainError) {
        *self.next_swap_error.lock() = Some(error);
    }

    /// Fail the next `suspended` read.
    pub fn fail_next_suspended(&self, error: ChainError) {
        *self.next_suspended_error.lock() = Some(error);
    }

    /// Make subsequent confirmation waits end with `result`.
    pub fn set_confirm_result(&self, result: ChainResult<()>) {
        *self.confirm_result.lock() = result;
    }

    /// Hold confirmation waits until the returned gate is notified.
    #[must_use]
    pub fn hold_confirmations(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.confirm_gate.lock() = Some(gate.clone());
        gate
    }

    /// Recorded `estimate_swap` calls as `(amount, use_delegation)`.
    #[must_use]
    pub fn estimate_calls(&self) -> Vec<(U256, bool)> {
        self.estimate_calls.lock().clone()
    }

    /// Recorded `swap` calls as `(amount, use_delegation)`.
    #[must_use]
    pub fn swap_calls(&self) -> Vec<(U256, bool)> {
        self.swap_calls.lock().clone()
    }
}

impl SwapContract for MockSwap {
    fn address(&self) -> Address {
        self.address
    }

    fn suspended(&self) -> BoxFuture<'_, ChainResult<bool>> {
        Box::pin(async move {
            if let Some(error) = self.next_suspended_error.lock().take() {
                return Err(error);
            }
            Ok(*self.suspended.lock())
        })
    }

    fn estimate_swap(
        &self,
        amount: U256,
        use_delegation: bool,
    ) -> BoxFuture<'_, ChainResult<U256>> {
        Box::pin(async move {
            self.estimate_calls.lock().push((amount, use_delegation));
            self.estimate.lock().clone()
        })
    }

    fn swap(&self, amount: U256, use_delegation: bool) -> BoxFuture<'_, ChainResult<DynTxHandle>> {
        Box::pin(async move {
            self.swap_calls.lock().push((amount, use_delegation));
            if let Some(error) = self.next_swap_error.lock().take() {
                return Err(error);
            }
            let handle: DynTxHandle = Box::new(MockTxHandle {
                hash: hash_from_counter(&self.hashes),
                result: self.confirm_result.lock().clone(),
                gate: self.confirm_gate.lock().clone(),
            });
            Ok(handle)
        })
    }
}

/// Recording delegate-approval registry fake.
pub struct MockDelegates {
    granted: Mutex<HashSet<(Address, Address)>>,
    query_calls: Mutex<Vec<(Address, Address)>>,
    approve_calls: Mutex<Vec<Address>>,
    next_query_error: Mutex<Option<ChainError>>,
    next_approve_error: Mutex<Option<ChainError>>,
    hashes: AtomicU64,
}

impl MockDelegates {
    /// Create an empty registry fake.
    #[must_use]
    pub fn new() -> Self {
        Self {
            granted: Mutex::new(HashSet::new()),
            query_calls: Mutex::new(Vec::new()),
            approve_calls: Mutex::new(Vec::new()),
            next_query_error: Mutex::new(None),
            next_approve_error: Mutex::new(None),
            hashes: AtomicU64::new(0),
        }
    }

    /// Pre-grant delegation from `account` to `delegate`.
    pub fn grant(&self, account: Address, delegate: Address) {
        self.granted.lock().insert((account, delegate));
    }

    /// Fail the next `can_exchange_for` query.
    pub fn fail_next_query(&self, error: ChainError) {
        *self.next_query_error.lock() = Some(error);
    }

    /// Fail the next `approve_exchange_on_behalf` call.
    pub fn fail_next_approve(&self, error: ChainError) {
        *self.next_approve_error.lock() = Some(error);
    }

    /// Recorded `can_exchange_for` calls.
    #[must_use]
    pub fn query_calls(&self) -> Vec<(Address, Address)> {
        self.query_calls.lock().clone()
    }

    /// Recorded `approve_exchange_on_behalf` calls.
    #[must_use]
    pub fn approve_calls(&self) -> Vec<Address> {
        self.approve_calls.lock().clone()
    }
}

impl Default for MockDelegates {
    fn default() -> Self {
        Self::new()
    }
}

impl DelegateApprovals for MockDelegates {
    fn can_exchange_for(
        &self,
        account: Address,
        delegate: Address,
    ) -> BoxFuture<'_, ChainResult<bool>> {
        Box::pin(async move {
            self.query_calls.lock().push((account, delegate));
            if let Some(error) = self.next_query_error.lock().take() {
                return Err(error);
            }
            Ok(self.granted.lock().contains(&(account, delegate)))
        })
    }

    fn approve_exchange_on_behalf(
        &self,
        delegate: Address,
    ) -> BoxFuture<'_, ChainResult<DynTxHandle>> {
        Box::pin(async move {
            self.approve_calls.lock().push(delegate);
            if let Some(error) = self.next_approve_error.lock().take() {
                return Err(error);
            }
            let handle: DynTxHandle = Box::new(MockTxHandle::ok(hash_from_counter(&self.hashes)));
            Ok(handle)
        })
    }
}

/// Wallet provider fake.
///
/// Contract handles must be registered per address before setup runs;
/// asking for an unregistered address yields an empty default fake so
/// tests fail on assertions rather than panics.
pub struct MockWallet {
    accounts: Mutex<Vec<Address>>,
    network: Mutex<String>,
    tokens: Mutex<HashMap<Address, Arc<MockToken>>>,
    swaps: Mutex<HashMap<Address, Arc<MockSwap>>>,
    delegates: Mutex<HashMap<Address, Arc<MockDelegates>>>,
    next_accounts_error: Mutex<Option<ChainError>>,
    next_network_error: Mutex<Option<ChainError>>,
    event_tx: Mutex<Option<mpsc::Sender<ChainEvent>>>,
    feed_starts: AtomicU64,
}

impl MockWallet {
    /// Create a wallet on `network` with no accounts.
    #[must_use]
    pub fn new(network: &str) -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
            network: Mutex::new(network.to_string()),
            tokens: Mutex::new(HashMap::new()),
            swaps: Mutex::new(HashMap::new()),
            delegates: Mutex::new(HashMap::new()),
            next_accounts_error: Mutex::new(None),
            next_network_error: Mutex::new(None),
            event_tx: Mutex::new(None),
            feed_starts: AtomicU64::new(0),
        }
    }

    /// Set the account list.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock() = accounts;
    }

    /// Switch the reported network.
    pub fn set_network(&self, network: &str) {
        *self.network.lock() = network.to_string();
    }

    /// Register the token fake served at `address`.
    pub fn register_token(&self, address: Address, token: Arc<MockToken>) {
        self.tokens.lock().insert(address, token);
    }

    /// Register the swap fake served at `address`.
    pub fn register_swap(&self, address: Address, swap: Arc<MockSwap>) {
        self.swaps.lock().insert(address, swap);
    }

    /// Register the delegate-registry fake served at `address`.
    pub fn register_delegates(&self, address: Address, delegates: Arc<MockDelegates>) {
        self.delegates.lock().insert(address, delegates);
    }

    /// Fail the next `request_accounts` call.
    pub fn fail_next_accounts(&self, error: ChainError) {
        *self.next_accounts_error.lock() = Some(error);
    }

    /// Fail the next `network_name` call.
    pub fn fail_next_network(&self, error: ChainError) {
        *self.next_network_error.lock() = Some(error);
    }

    /// Push an event into the registered feed. Returns false when the
    /// feed was never started or the receiver is gone.
    pub fn emit(&self, event: ChainEvent) -> bool {
        match self.event_tx.lock().as_ref() {
            Some(tx) => tx.try_send(event).is_ok(),
            None => false,
        }
    }

    /// How many times `start_event_feed` was invoked.
    #[must_use]
    pub fn feed_starts(&self) -> u64 {
        self.feed_starts.load(Ordering::Acquire)
    }
}

impl WalletProvider for MockWallet {
    fn request_accounts(&self) -> BoxFuture<'_, ChainResult<Vec<Address>>> {
        Box::pin(async move {
            if let Some(error) = self.next_accounts_error.lock().take() {
                return Err(error);
            }
            Ok(self.accounts.lock().clone())
        })
    }

    fn network_name(&self) -> BoxFuture<'_, ChainResult<String>> {
        Box::pin(async move {
            if let Some(error) = self.next_network_error.lock().take() {
                return Err(error);
            }
            Ok(self.network.lock().clone())
        })
    }

    fn token_contract(&self, address: Address) -> Arc<dyn TokenContract> {
        let token = self
            .tokens
            .lock()
            .get(&address)
            .cloned()
            .unwrap_or_else(|| Arc::new(MockToken::new(18)));
        token
    }

    fn swap_contract(&self, address: Address) -> Arc<dyn SwapContract> {
        let swap = self
            .swaps
            .lock()
            .get(&address)
            .cloned()
            .unwrap_or_else(|| Arc::new(MockSwap::new(address)));
        swap
    }

    fn delegate_contract(&self, address: Address) -> Arc<dyn DelegateApprovals> {
        let delegates = self
            .delegates
            .lock()
            .get(&address)
            .cloned()
            .unwrap_or_else(|| Arc::new(MockDelegates::new()));
        delegates
    }

    fn start_event_feed(&self, events: mpsc::Sender<ChainEvent>) -> ChainResult<()> {
        self.feed_starts.fetch_add(1, Ordering::AcqRel);
        *self.event_tx.lock() = Some(events);
        Ok(())
    }
}
