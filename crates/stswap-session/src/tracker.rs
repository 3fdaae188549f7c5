//! Block-driven balance tracking.
//!
//! On each new-block notification the tracker re-reads both token
//! balances and the market suspension flag, replacing the snapshot
//! wholesale. Reads are best-effort: a failed read keeps the previous
//! value and logs, never interrupting the user. No retries; the next
//! block triggers the next attempt.

use crate::state::ActiveSession;
use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::warn;

/// Last observed balances and market state.
///
/// Reflects some block at or after the one that triggered the refresh;
/// last write wins.
#[derive(Debug, Clone, Default)]
pub struct BalanceSnapshot {
    /// Spend-currency balance of the active account.
    pub spend_balance: U256,
    /// Target-currency balance of the active account.
    pub target_balance: U256,
    /// Whether the trading venue currently accepts swaps.
    pub market_open: bool,
    /// Block height of the triggering notification, when known.
    pub block: Option<u64>,
    /// When the snapshot was last refreshed.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Shared balance snapshot, refreshed off provider block events.
#[derive(Debug, Default)]
pub struct BalanceTracker {
    snapshot: RwLock<BalanceSnapshot>,
}

impl BalanceTracker {
    /// Create a tracker with an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> BalanceSnapshot {
        self.snapshot.read().clone()
    }

    /// Reset to the empty snapshot (on session teardown).
    pub fn clear(&self) {
        *self.snapshot.write() = BalanceSnapshot::default();
    }

    /// Re-read balances and the market flag for the session's account.
    ///
    /// Each of the three reads fails independently; a failure keeps the
    /// prior value in place.
    pub async fn refresh(&self, session: &ActiveSession, block: Option<u64>) {
        let contracts = &session.contracts;
        let spend = contracts.spend_token.balance_of(session.account).await;
        let target = contracts.target_token.balance_of(session.account).await;
        let suspended = contracts.swap.suspended().await;

        let mut snapshot = self.snapshot.write();
        match spend {
            Ok(balance) => snapshot.spend_balance = balance,
            Err(e) => warn!(error = %e, "Spend balance read failed, keeping previous value"),
        }
        match target {
            Ok(balance) => snapshot.target_balance = balance,
            Err(e) => warn!(error = %e, "Target balance read failed, keeping previous value"),
        }
        match suspended {
            Ok(suspended) => snapshot.market_open = !suspended,
            Err(e) => warn!(error = %e, "Suspension read failed, keeping previous value"),
        }
        if block.is_some() {
            snapshot.block = block;
        }
        snapshot.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ContractHandles;
    use alloy::primitives::{address, Address};
    use std::sync::Arc;
    use stswap_chain::mock::{MockDelegates, MockSwap, MockToken, MockWallet};
    use stswap_chain::{ChainError, WalletProvider};
    use stswap_registry::AddressSet;

    const ACCOUNT: Address = address!("00000000000000000000000000000000000000aa");

    struct Fixture {
        spend: Arc<MockToken>,
        target: Arc<MockToken>,
        swap: Arc<MockSwap>,
        session: ActiveSession,
    }

    fn fixture() -> Fixture {
        let addresses = AddressSet {
            spend_token: address!("0000000000000000000000000000000000000011"),
            target_token: address!("0000000000000000000000000000000000000012"),
            swap: address!("0000000000000000000000000000000000000013"),
            delegate_approvals: address!("0000000000000000000000000000000000000014"),
        };

        let spend = Arc::new(MockToken::new(6));
        let target = Arc::new(MockToken::new(18));
        let swap = Arc::new(MockSwap::new(addresses.swap));
        let delegates = Arc::new(MockDelegates::new());

        let wallet = MockWallet::new("homestead_fork");
        wallet.register_token(addresses.spend_token, spend.clone());
        wallet.register_token(addresses.target_token, target.clone());
        wallet.register_swap(addresses.swap, swap.clone());
        wallet.register_delegates(addresses.delegate_approvals, delegates);

        let contracts = ContractHandles {
            addresses,
            spend_token: wallet.token_contract(addresses.spend_token),
            target_token: wallet.token_contract(addresses.target_token),
            swap: wallet.swap_contract(addresses.swap),
            delegates: wallet.delegate_contract(addresses.delegate_approvals),
            spend_decimals: 6,
            target_decimals: 18,
        };

        let session = ActiveSession {
            account: ACCOUNT,
            network: "homestead_fork".to_string(),
            contracts,
        };

        Fixture {
            spend,
            target,
            swap,
            session,
        }
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let f = fixture();
        f.spend.set_balance(ACCOUNT, U256::from(100u64));
        f.target.set_balance(ACCOUNT, U256::from(5u64));

        let tracker = BalanceTracker::new();
        tracker.refresh(&f.session, Some(42)).await;

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.spend_balance, U256::from(100u64));
        assert_eq!(snapshot.target_balance, U256::from(5u64));
        assert!(snapshot.market_open);
        assert_eq!(snapshot.block, Some(42));
        assert!(snapshot.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_suspended_market_reads_closed() {
        let f = fixture();
        f.swap.set_suspended(true);

        let tracker = BalanceTracker::new();
        tracker.refresh(&f.session, None).await;
        assert!(!tracker.snapshot().market_open);
    }

    #[tokio::test]
    async fn test_failed_read_keeps_previous_value() {
        let f = fixture();
        f.spend.set_balance(ACCOUNT, U256::from(100u64));
        f.target.set_balance(ACCOUNT, U256::from(5u64));

        let tracker = BalanceTracker::new();
        tracker.refresh(&f.session, Some(1)).await;

        // Next spend read fails; target moves on
        f.spend
            .fail_next_read(ChainError::Rpc("flaky node".to_string()));
        f.target.set_balance(ACCOUNT, U256::from(6u64));
        tracker.refresh(&f.session, Some(2)).await;

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.spend_balance, U256::from(100u64));
        assert_eq!(snapshot.target_balance, U256::from(6u64));
        assert_eq!(snapshot.block, Some(2));
    }

    #[tokio::test]
    async fn test_clear_resets() {
        let f = fixture();
        f.spend.set_balance(ACCOUNT, U256::from(100u64));

        let tracker = BalanceTracker::new();
        tracker.refresh(&f.session, Some(1)).await;
        tracker.clear();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.spend_balance, U256::ZERO);
        assert!(snapshot.updated_at.is_none());
        assert!(!snapshot.market_open);
    }
}
