//! JSON-RPC implementations of the chain boundary.
//!
//! A local-key signer over an HTTP provider stands in for the browser-
//! injected wallet: the account list is the configured signer, the
//! network is derived from the chain id, and new-block notifications
//! come from a polling pump feeding the session event channel.

use crate::boundary::{
    BoxFuture, DelegateApprovals, DynTxHandle, DynWalletProvider, SwapContract, TokenContract,
    TxHandle, WalletProvider,
};
use crate::error::{ChainError, ChainResult};
use crate::event::ChainEvent;
use alloy::network::{Ethereum, EthereumWallet};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::transports::http::{reqwest::Url, Client, Http};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

type HttpTransport = Http<Client>;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[sol(rpc)]
    interface IBuySynth {
        function stsla_suspended() external view returns (bool);
        function est_swap_usdc_to_stsla(uint256 usdc_amount, bool use_delegation) external view returns (uint256);
        function swap_usdc_to_stsla(uint256 usdc_amount, bool use_delegation) external returns (uint256);
    }

    #[sol(rpc)]
    interface IDelegateApprovals {
        function canExchangeFor(address authoriser, address delegate) external view returns (bool);
        function approveExchangeOnBehalf(address delegate) external;
    }
}

/// Provider-style network name for a chain id.
///
/// Mirrors the naming the original wallet stack reported: mainnet is
/// `homestead`, and any chain the provider does not recognize (local
/// forks included) is `unknown`, which the address book aliases to the
/// designated fork network.
#[must_use]
pub fn network_name_for_chain(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "homestead",
        5 => "goerli",
        11155111 => "sepolia",
        137 => "matic",
        42161 => "arbitrum",
        10 => "optimism",
        8453 => "base",
        _ => "unknown",
    }
}

fn call_error(error: alloy::contract::Error) -> ChainError {
    let message = error.to_string();
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("rejected") || lowered.contains("denied") {
        ChainError::Rejected(message)
    } else {
        ChainError::Rpc(message)
    }
}

/// A broadcast transaction awaiting its receipt.
struct RpcTxHandle {
    hash: B256,
    pending: PendingTransactionBuilder<HttpTransport, Ethereum>,
}

impl TxHandle for RpcTxHandle {
    fn tx_hash(&self) -> B256 {
        self.hash
    }

    fn confirmed(self: Box<Self>) -> BoxFuture<'static, ChainResult<()>> {
        Box::pin(async move {
            let receipt = self
                .pending
                .get_receipt()
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))?;
            if receipt.status() {
                Ok(())
            } else {
                Err(ChainError::Reverted(format!(
                    "transaction {} reverted",
                    receipt.transaction_hash
                )))
            }
        })
    }
}

fn wrap_pending(pending: PendingTransactionBuilder<HttpTransport, Ethereum>) -> DynTxHandle {
    let hash = *pending.tx_hash();
    Box::new(RpcTxHandle { hash, pending })
}

/// ERC-20 over JSON-RPC.
pub struct RpcToken<P> {
    contract: IERC20::IERC20Instance<HttpTransport, P>,
}

impl<P> TokenContract for RpcToken<P>
where
    P: Provider<HttpTransport> + Clone + 'static,
{
    fn decimals(&self) -> BoxFuture<'_, ChainResult<u8>> {
        Box::pin(async move {
            self.contract
                .decimals()
                .call()
                .await
                .map(|r| r._0)
                .map_err(call_error)
        })
    }

    fn balance_of(&self, owner: Address) -> BoxFuture<'_, ChainResult<U256>> {
        Box::pin(async move {
            self.contract
                .balanceOf(owner)
                .call()
                .await
                .map(|r| r._0)
                .map_err(call_error)
        })
    }

    fn allowance(&self, owner: Address, spender: Address) -> BoxFuture<'_, ChainResult<U256>> {
        Box::pin(async move {
            self.contract
                .allowance(owner, spender)
                .call()
                .await
                .map(|r| r._0)
                .map_err(call_error)
        })
    }

    fn approve(&self, spender: Address, amount: U256) -> BoxFuture<'_, ChainResult<DynTxHandle>> {
        Box::pin(async move {
            let pending = self
                .contract
                .approve(spender, amount)
                .send()
                .await
                .map_err(call_error)?;
            Ok(wrap_pending(pending))
        })
    }
}

/// The swap contract over JSON-RPC.
pub struct RpcSwap<P> {
    contract: IBuySynth::IBuySynthInstance<HttpTransport, P>,
}

impl<P> SwapContract for RpcSwap<P>
where
    P: Provider<HttpTransport> + Clone + 'static,
{
    fn address(&self) -> Address {
        *self.contract.address()
    }

    fn suspended(&self) -> BoxFuture<'_, ChainResult<bool>> {
        Box::pin(async move {
            self.contract
                .stsla_suspended()
                .call()
                .await
                .map(|r| r._0)
                .map_err(call_error)
        })
    }

    fn estimate_swap(
        &self,
        amount: U256,
        use_delegation: bool,
    ) -> BoxFuture<'_, ChainResult<U256>> {
        Box::pin(async move {
            self.contract
                .est_swap_usdc_to_stsla(amount, use_delegation)
                .call()
                .await
                .map(|r| r._0)
                .map_err(call_error)
        })
    }

    fn swap(&self, amount: U256, use_delegation: bool) -> BoxFuture<'_, ChainResult<DynTxHandle>> {
        Box::pin(async move {
            let pending = self
                .contract
                .swap_usdc_to_stsla(amount, use_delegation)
                .send()
                .await
                .map_err(call_error)?;
            Ok(wrap_pending(pending))
        })
    }
}

/// The Synthetix delegate-approval registry over JSON-RPC.
pub struct RpcDelegates<P> {
    contract: IDelegateApprovals::IDelegateApprovalsInstance<HttpTransport, P>,
}

impl<P> DelegateApprovals for RpcDelegates<P>
where
    P: Provider<HttpTransport> + Clone + 'static,
{
    fn can_exchange_for(
        &self,
        account: Address,
        delegate: Address,
    ) -> BoxFuture<'_, ChainResult<bool>> {
        Box::pin(async move {
            self.contract
                .canExchangeFor(account, delegate)
                .call()
                .await
                .map(|r| r._0)
                .map_err(call_error)
        })
    }

    fn approve_exchange_on_behalf(
        &self,
        delegate: Address,
    ) -> BoxFuture<'_, ChainResult<DynTxHandle>> {
        Box::pin(async move {
            let pending = self
                .contract
                .approveExchangeOnBehalf(delegate)
                .send()
                .await
                .map_err(call_error)?;
            Ok(wrap_pending(pending))
        })
    }
}

/// Wallet provider backed by an HTTP JSON-RPC endpoint and a local
/// signing key.
///
/// The account list is the single configured signer and never changes,
/// and the chain behind one endpoint is fixed, so the event pump only
/// emits `NewBlock`; account and network change events exist for
/// provider implementations that can produce them.
pub struct RpcWalletProvider<P> {
    provider: P,
    account: Address,
    poll_interval: Duration,
}

impl<P> RpcWalletProvider<P>
where
    P: Provider<HttpTransport> + Clone + 'static,
{
    /// Create a provider around `account`'s signer-backed transport.
    #[must_use]
    pub fn new(provider: P, account: Address, poll_interval: Duration) -> Self {
        Self {
            provider,
            account,
            poll_interval,
        }
    }

    /// The configured signer account.
    #[must_use]
    pub fn account(&self) -> Address {
        self.account
    }
}

impl<P> WalletProvider for RpcWalletProvider<P>
where
    P: Provider<HttpTransport> + Clone + 'static,
{
    fn request_accounts(&self) -> BoxFuture<'_, ChainResult<Vec<Address>>> {
        Box::pin(async move {
            // Probe the endpoint so an unreachable node surfaces as the
            // wallet being unavailable rather than as a later call
            // failing mid-setup.
            self.provider
                .get_chain_id()
                .await
                .map_err(|e| ChainError::Unavailable(e.to_string()))?;
            Ok(vec![self.account])
        })
    }

    fn network_name(&self) -> BoxFuture<'_, ChainResult<String>> {
        Box::pin(async move {
            let chain_id = self
                .provider
                .get_chain_id()
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))?;
            Ok(network_name_for_chain(chain_id).to_string())
        })
    }

    fn token_contract(&self, address: Address) -> Arc<dyn TokenContract> {
        Arc::new(RpcToken {
            contract: IERC20::new(address, self.provider.clone()),
        })
    }

    fn swap_contract(&self, address: Address) -> Arc<dyn SwapContract> {
        Arc::new(RpcSwap {
            contract: IBuySynth::new(address, self.provider.clone()),
        })
    }

    fn delegate_contract(&self, address: Address) -> Arc<dyn DelegateApprovals> {
        Arc::new(RpcDelegates {
            contract: IDelegateApprovals::new(address, self.provider.clone()),
        })
    }

    fn start_event_feed(&self, events: mpsc::Sender<ChainEvent>) -> ChainResult<()> {
        let provider = self.provider.clone();
        let poll_interval = self.poll_interval;
        tokio::spawn(async move {
            let poller = match provider.watch_blocks().await {
                Ok(poller) => poller.with_poll_interval(poll_interval),
                Err(e) => {
                    warn!(error = %e, "Block watcher failed to start, no balance refreshes");
                    return;
                }
            };
            let mut stream = poller.into_stream();
            while let Some(hashes) = stream.next().await {
                if hashes.is_empty() {
                    continue;
                }
                let number = match provider.get_block_number().await {
                    Ok(number) => number,
                    Err(e) => {
                        debug!(error = %e, "Block number fetch failed, skipping tick");
                        continue;
                    }
                };
                if events.send(ChainEvent::NewBlock(number)).await.is_err() {
                    // Receiver gone: session consumer shut down.
                    break;
                }
            }
        });
        Ok(())
    }
}

/// Build a wallet provider from an HTTP endpoint and a private key.
pub fn connect_http(
    rpc_url: &str,
    private_key: &str,
    poll_interval: Duration,
) -> ChainResult<DynWalletProvider> {
    let signer: PrivateKeySigner = private_key
        .trim()
        .parse()
        .map_err(|e: alloy::signers::local::LocalSignerError| {
            ChainError::InvalidKey(e.to_string())
        })?;
    let account = signer.address();

    let url: Url = rpc_url
        .parse()
        .map_err(|e| ChainError::Unavailable(format!("invalid RPC url {rpc_url}: {e}")))?;

    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(EthereumWallet::from(signer))
        .on_http(url);

    Ok(Arc::new(RpcWalletProvider::new(
        provider,
        account,
        poll_interval,
    )))
}
