//! Wallet session manager.
//!
//! Owns the `WalletState` machine and the provider event channel. All
//! session mutation happens here; everything else reads snapshots.

use crate::error::{SessionError, SessionResult};
use crate::state::{ActiveSession, ContractHandles, WalletState};
use alloy::primitives::Address;
use stswap_chain::{ChainError, ChainEvent, DynWalletProvider};
use stswap_registry::AddressBook;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Capacity of the provider event channel. Block ticks beyond this are
/// dropped by the sender, which is fine: refreshes are wholesale.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Connection lifecycle owner.
///
/// State transitions:
/// - `Disconnected → Connecting`: connect action; repeated connects
///   while not disconnected are no-ops
/// - `Connecting → Connected`: account granted AND network resolved AND
///   all handles built AND token decimals fetched
/// - `Connecting → Disconnected`: any setup failure, each with its own
///   `SessionError`
/// - `Connected` + network change: handles rebuilt in place; an
///   unsupported network degrades the session to `Disconnected`
pub struct SessionManager {
    provider: DynWalletProvider,
    address_book: AddressBook,
    state: WalletState,
    session: Option<ActiveSession>,
    event_tx: mpsc::Sender<ChainEvent>,
    event_rx: Option<mpsc::Receiver<ChainEvent>>,
    feed_registered: bool,
}

impl SessionManager {
    /// Create a manager over `provider` with the given address table.
    #[must_use]
    pub fn new(provider: DynWalletProvider, address_book: AddressBook) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            provider,
            address_book,
            state: WalletState::Disconnected,
            session: None,
            event_tx,
            event_rx: Some(event_rx),
            feed_registered: false,
        }
    }

    /// Current wallet state.
    #[must_use]
    pub fn state(&self) -> WalletState {
        self.state
    }

    /// The active session, present only while `Connected`.
    #[must_use]
    pub fn session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    /// Take the receiving end of the provider event channel.
    ///
    /// The consumer loop calls this once and routes events back into
    /// `handle_network_change` / `handle_accounts_change`.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<ChainEvent>> {
        self.event_rx.take()
    }

    /// Run connection setup.
    ///
    /// Returns `Ok(true)` when a session was established, `Ok(false)`
    /// when the call was a no-op because a connect is already in flight
    /// or done. On failure the state is rolled back to `Disconnected`
    /// and the triggering control is usable again.
    pub async fn connect(&mut self) -> SessionResult<bool> {
        if self.state != WalletState::Disconnected {
            return Ok(false);
        }
        self.state = WalletState::Connecting;

        match self.establish().await {
            Ok(session) => {
                // The provider feed is registered exactly once per
                // process; reconnects re-use the running pump so no
                // duplicate notifications can accumulate.
                if !self.feed_registered {
                    if let Err(e) = self.provider.start_event_feed(self.event_tx.clone()) {
                        self.state = WalletState::Disconnected;
                        return Err(SessionError::Setup(e));
                    }
                    self.feed_registered = true;
                }
                info!(account = %session.account, network = %session.network, "Wallet connected");
                self.session = Some(session);
                self.state = WalletState::Connected;
                Ok(true)
            }
            Err(e) => {
                self.session = None;
                self.state = WalletState::Disconnected;
                Err(e)
            }
        }
    }

    /// Tear down the session.
    pub fn disconnect(&mut self) {
        if self.session.take().is_some() {
            info!("Wallet disconnected");
        }
        self.state = WalletState::Disconnected;
    }

    /// React to a provider network change.
    ///
    /// While connected, the address-resolution-and-handle-construction
    /// step re-runs in place without leaving `Connected`. If the new
    /// network is unsupported (or the rebuild fails), the session
    /// degrades to `Disconnected` and the error carries the
    /// human-friendly network name.
    pub async fn handle_network_change(&mut self, network: String) -> SessionResult<()> {
        if self.state != WalletState::Connected {
            return Ok(());
        }

        match self.build_contracts(&network).await {
            Ok(contracts) => {
                if let Some(session) = self.session.as_mut() {
                    session.network = network.clone();
                    session.contracts = contracts;
                }
                info!(network = %network, "Contract handles rebuilt for new network");
                Ok(())
            }
            Err(e) => {
                warn!(network = %network, error = %e, "Session degraded on network change");
                self.session = None;
                self.state = WalletState::Disconnected;
                Err(e)
            }
        }
    }

    /// React to a provider account change.
    ///
    /// Adopts the new primary account without changing `WalletState`
    /// and returns it so the caller can re-fetch balances. An empty
    /// account list means the wallet revoked access entirely and the
    /// session is torn down.
    pub fn handle_accounts_change(&mut self, accounts: Vec<Address>) -> Option<Address> {
        let session = self.session.as_mut()?;
        match accounts.first() {
            Some(&account) => {
                if session.account != account {
                    info!(account = %account, "Active account changed");
                    session.account = account;
                }
                Some(account)
            }
            None => {
                warn!("Wallet revoked all accounts");
                self.disconnect();
                None
            }
        }
    }

    async fn establish(&self) -> SessionResult<ActiveSession> {
        let accounts = self
            .provider
            .request_accounts()
            .await
            .map_err(|e| match e {
                ChainError::Unavailable(m) => SessionError::WalletUnavailable(m),
                ChainError::Rejected(m) => SessionError::ConnectionRejected(m),
                other => SessionError::Setup(other),
            })?;
        let account = *accounts
            .first()
            .ok_or_else(|| SessionError::ConnectionRejected("no account granted".to_string()))?;

        let network = self.provider.network_name().await?;
        let contracts = self.build_contracts(&network).await?;

        Ok(ActiveSession {
            account,
            network,
            contracts,
        })
    }

    /// Resolve `network` and construct the full handle set, including
    /// per-token decimal metadata. All-or-nothing: any failure leaves
    /// no partial state behind.
    async fn build_contracts(&self, network: &str) -> SessionResult<ContractHandles> {
        let addresses = *self.address_book.resolve(network).ok_or_else(|| {
            SessionError::UnsupportedNetwork(self.address_book.display_name(network))
        })?;

        let spend_token = self.provider.token_contract(addresses.spend_token);
        let target_token = self.provider.token_contract(addresses.target_token);
        let swap = self.provider.swap_contract(addresses.swap);
        let delegates = self.provider.delegate_contract(addresses.delegate_approvals);

        let spend_decimals = spend_token.decimals().await?;
        let target_decimals = target_token.decimals().await?;

        Ok(ContractHandles {
            addresses,
            spend_token,
            target_token,
            swap,
            delegates,
            spend_decimals,
            target_decimals,
        })
    }
}
