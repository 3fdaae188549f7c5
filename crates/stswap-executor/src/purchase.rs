//! The buy sequence.
//!
//! # Step Order (Strict)
//!
//! 0. latch already held       → Rejected(PurchaseInFlight), nothing runs
//! 1. amount > spend balance   → Rejected(InsufficientBalance)
//! 2. amount == 0              → Rejected(NonPositiveAmount)
//! 3. take the pending latch   → cleared on every exit below
//! 4. allowance < amount       → approve(swap, U256::MAX), else skip
//! 5. market open && no grant  → approve_exchange_on_behalf(swap)
//! 6. swap(amount, market_open) → report pending, await confirmation
//!
//! Steps 1–2 read the tracked snapshot, so a rejected purchase makes no
//! contract call at all. The allowance check uses `<=` (an amount equal
//! to the current allowance needs no new approval); the balance check
//! uses strict `>` (spending the exact balance is allowed).

use crate::status::{failure_message, StatusUpdate};
use alloy::primitives::{B256, U256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stswap_chain::ChainError;
use stswap_session::{ActiveSession, BalanceTracker};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Why a purchase was rejected before any contract call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Another purchase holds the latch.
    PurchaseInFlight,
    /// Spend amount exceeds the tracked balance.
    InsufficientBalance,
    /// Spend amount is zero.
    NonPositiveAmount,
}

/// Which phase a failed purchase died in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailStage {
    /// Reading the current allowance.
    AllowanceQuery,
    /// The spending-approval transaction.
    Approval,
    /// Querying existing delegated-trading permission.
    DelegateQuery,
    /// The delegated-trading approval transaction.
    DelegateApproval,
    /// Swap submission.
    Submission,
    /// The confirmation wait after submission.
    Confirmation,
}

/// Result of one `buy` invocation.
#[derive(Debug)]
pub enum PurchaseOutcome {
    /// Swap confirmed on chain.
    Completed { tx_hash: B256 },
    /// Rejected before touching any contract.
    Rejected { reason: RejectReason },
    /// A chain call failed; the purchase aborted at `stage`.
    Failed { stage: FailStage, error: ChainError },
}

impl PurchaseOutcome {
    /// Check whether the swap confirmed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, PurchaseOutcome::Completed { .. })
    }
}

/// Clears the pending latch on every exit path, normal or panic, so
/// the buy control is never left permanently disabled.
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Purchase orchestrator.
///
/// Holds the re-entrancy latch and the status channel; per-purchase
/// state lives on the stack of one `buy` call.
pub struct PurchaseFlow {
    tracker: Arc<BalanceTracker>,
    status_tx: mpsc::UnboundedSender<StatusUpdate>,
    tx_pending: AtomicBool,
}

impl PurchaseFlow {
    /// Create a flow reading balances from `tracker` and reporting
    /// phase updates into `status_tx`.
    #[must_use]
    pub fn new(tracker: Arc<BalanceTracker>, status_tx: mpsc::UnboundedSender<StatusUpdate>) -> Self {
        Self {
            tracker,
            status_tx,
            tx_pending: AtomicBool::new(false),
        }
    }

    /// Whether a purchase currently holds the latch.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.tx_pending.load(Ordering::Acquire)
    }

    /// Execute a purchase of `spend_amount` raw spend-token units.
    pub async fn buy(&self, session: &ActiveSession, spend_amount: U256) -> PurchaseOutcome {
        if self.tx_pending.load(Ordering::Acquire) {
            self.status(StatusUpdate::PurchaseInFlight);
            return PurchaseOutcome::Rejected {
                reason: RejectReason::PurchaseInFlight,
            };
        }

        let snapshot = self.tracker.snapshot();
        if spend_amount > snapshot.spend_balance {
            self.status(StatusUpdate::InsufficientBalance);
            return PurchaseOutcome::Rejected {
                reason: RejectReason::InsufficientBalance,
            };
        }
        if spend_amount.is_zero() {
            self.status(StatusUpdate::NonPositiveAmount);
            return PurchaseOutcome::Rejected {
                reason: RejectReason::NonPositiveAmount,
            };
        }

        if self
            .tx_pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.status(StatusUpdate::PurchaseInFlight);
            return PurchaseOutcome::Rejected {
                reason: RejectReason::PurchaseInFlight,
            };
        }
        let _pending = PendingGuard(&self.tx_pending);

        let contracts = &session.contracts;
        let spender = contracts.swap.address();

        // Spending approval, skipped when the allowance already covers
        // the amount.
        let allowance = match contracts
            .spend_token
            .allowance(session.account, spender)
            .await
        {
            Ok(allowance) => allowance,
            Err(e) => return self.fail(FailStage::AllowanceQuery, e),
        };
        if spend_amount > allowance {
            self.status(StatusUpdate::ApprovingSpend);
            // Max-value approval so future purchases skip the prompt.
            if let Err(e) = contracts.spend_token.approve(spender, U256::MAX).await {
                return self.fail(FailStage::Approval, e);
            }
        } else {
            debug!(%allowance, %spend_amount, "Allowance covers spend, skipping approval");
        }

        // Delegated-trading approval, only while the market is open.
        // A suspended market routes the swap down its direct path.
        let use_delegation = snapshot.market_open;
        if use_delegation {
            match contracts
                .delegates
                .can_exchange_for(session.account, spender)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    self.status(StatusUpdate::DelegateApprovalRequested);
                    if let Err(e) = contracts.delegates.approve_exchange_on_behalf(spender).await {
                        return self.fail(FailStage::DelegateApproval, e);
                    }
                }
                Err(e) => return self.fail(FailStage::DelegateQuery, e),
            }
        }

        // Swap submission and confirmation wait.
        let handle = match contracts.swap.swap(spend_amount, use_delegation).await {
            Ok(handle) => handle,
            Err(e) => return self.fail(FailStage::Submission, e),
        };
        let tx_hash = handle.tx_hash();
        self.status(StatusUpdate::SwapPending { tx_hash });

        match handle.confirmed().await {
            Ok(()) => {
                self.status(StatusUpdate::SwapConfirmed { tx_hash });
                PurchaseOutcome::Completed { tx_hash }
            }
            Err(e) => self.fail(FailStage::Confirmation, e),
        }
    }

    /// Estimate the target-currency return for a spend amount.
    ///
    /// Uses the same delegation flag a purchase would use right now.
    /// Any failure resets the displayed estimate to zero rather than
    /// leaving a stale value.
    pub async fn estimate_return(&self, session: &ActiveSession, spend_amount: U256) -> U256 {
        let use_delegation = self.tracker.snapshot().market_open;
        match session
            .contracts
            .swap
            .estimate_swap(spend_amount, use_delegation)
            .await
        {
            Ok(expected) => expected,
            Err(e) => {
                debug!(error = %e, "Return estimate failed, resetting to zero");
                U256::ZERO
            }
        }
    }

    fn fail(&self, stage: FailStage, error: ChainError) -> PurchaseOutcome {
        warn!(?stage, error = %error, "Purchase aborted");
        self.status(StatusUpdate::Failed {
            message: failure_message(&error),
        });
        PurchaseOutcome::Failed { stage, error }
    }

    fn status(&self, update: StatusUpdate) {
        // Receiver gone means nobody is displaying; not an error.
        let _ = self.status_tx.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Address};
    use std::time::Duration;
    use stswap_chain::mock::{MockDelegates, MockSwap, MockToken, MockWallet};
    use stswap_chain::WalletProvider;
    use stswap_registry::AddressSet;
    use stswap_session::ContractHandles;

    const ACCOUNT: Address = address!("00000000000000000000000000000000000000aa");
    const SWAP_ADDR: Address = address!("0000000000000000000000000000000000000013");

    struct Fixture {
        spend: Arc<MockToken>,
        swap: Arc<MockSwap>,
        delegates: Arc<MockDelegates>,
        tracker: Arc<BalanceTracker>,
        session: ActiveSession,
        status_rx: mpsc::UnboundedReceiver<StatusUpdate>,
        flow: PurchaseFlow,
    }

    impl Fixture {
        fn drain_statuses(&mut self) -> Vec<StatusUpdate> {
            let mut updates = Vec::new();
            while let Ok(update) = self.status_rx.try_recv() {
                updates.push(update);
            }
            updates
        }
    }

    /// Spend token with 0 decimals, balance 100; market open; no
    /// delegation granted; allowance 0 unless a test sets it.
    async fn fixture() -> Fixture {
        let addresses = AddressSet {
            spend_token: address!("0000000000000000000000000000000000000011"),
            target_token: address!("0000000000000000000000000000000000000012"),
            swap: SWAP_ADDR,
            delegate_approvals: address!("0000000000000000000000000000000000000014"),
        };

        let spend = Arc::new(MockToken::new(0));
        spend.set_balance(ACCOUNT, U256::from(100u64));
        let target = Arc::new(MockToken::new(18));
        let swap = Arc::new(MockSwap::new(SWAP_ADDR));
        let delegates = Arc::new(MockDelegates::new());

        let wallet = MockWallet::new("homestead_fork");
        wallet.register_token(addresses.spend_token, spend.clone());
        wallet.register_token(addresses.target_token, target);
        wallet.register_swap(addresses.swap, swap.clone());
        wallet.register_delegates(addresses.delegate_approvals, delegates.clone());

        let session = ActiveSession {
            account: ACCOUNT,
            network: "homestead_fork".to_string(),
            contracts: ContractHandles {
                addresses,
                spend_token: wallet.token_contract(addresses.spend_token),
                target_token: wallet.token_contract(addresses.target_token),
                swap: wallet.swap_contract(addresses.swap),
                delegates: wallet.delegate_contract(addresses.delegate_approvals),
                spend_decimals: 0,
                target_decimals: 18,
            },
        };

        let tracker = Arc::new(BalanceTracker::new());
        tracker.refresh(&session, None).await;

        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let flow = PurchaseFlow::new(tracker.clone(), status_tx);

        Fixture {
            spend,
            swap,
            delegates,
            tracker,
            session,
            status_rx,
            flow,
        }
    }

    #[tokio::test]
    async fn test_insufficient_balance_terminates_without_contract_calls() {
        let mut f = fixture().await;

        let outcome = f.flow.buy(&f.session, U256::from(130u64)).await;
        assert!(matches!(
            outcome,
            PurchaseOutcome::Rejected {
                reason: RejectReason::InsufficientBalance
            }
        ));
        assert!(f.spend.approve_calls().is_empty());
        assert!(f.swap.swap_calls().is_empty());
        assert!(f.delegates.query_calls().is_empty());
        assert!(!f.flow.is_pending());
        assert_eq!(f.drain_statuses(), vec![StatusUpdate::InsufficientBalance]);
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let mut f = fixture().await;

        let outcome = f.flow.buy(&f.session, U256::ZERO).await;
        assert!(matches!(
            outcome,
            PurchaseOutcome::Rejected {
                reason: RejectReason::NonPositiveAmount
            }
        ));
        assert!(f.swap.swap_calls().is_empty());
        assert!(!f.flow.is_pending());
        assert_eq!(f.drain_statuses(), vec![StatusUpdate::NonPositiveAmount]);
    }

    #[tokio::test]
    async fn test_sufficient_allowance_skips_approval() {
        // balance 100, allowance 50, amount 30: approval skipped,
        // market open so the swap routes through delegation
        let f = fixture().await;
        f.spend.set_allowance(ACCOUNT, SWAP_ADDR, U256::from(50u64));
        f.delegates.grant(ACCOUNT, SWAP_ADDR);

        let outcome = f.flow.buy(&f.session, U256::from(30u64)).await;
        assert!(outcome.is_completed());
        assert!(f.spend.approve_calls().is_empty());
        assert_eq!(f.swap.swap_calls(), vec![(U256::from(30u64), true)]);
        assert!(!f.flow.is_pending());
    }

    #[tokio::test]
    async fn test_allowance_boundary_needs_no_approval() {
        let f = fixture().await;
        f.spend.set_allowance(ACCOUNT, SWAP_ADDR, U256::from(30u64));
        f.delegates.grant(ACCOUNT, SWAP_ADDR);

        let outcome = f.flow.buy(&f.session, U256::from(30u64)).await;
        assert!(outcome.is_completed());
        assert!(f.spend.approve_calls().is_empty());
    }

    #[tokio::test]
    async fn test_spending_exact_balance_allowed() {
        let f = fixture().await;
        f.spend
            .set_allowance(ACCOUNT, SWAP_ADDR, U256::from(100u64));
        f.delegates.grant(ACCOUNT, SWAP_ADDR);

        let outcome = f.flow.buy(&f.session, U256::from(100u64)).await;
        assert!(outcome.is_completed());
    }

    #[tokio::test]
    async fn test_low_allowance_triggers_max_approval_closed_market() {
        // balance 100, allowance 10, amount 30, market closed:
        // max-value approval, no delegation step, swap(30, false)
        let f = fixture().await;
        f.spend.set_allowance(ACCOUNT, SWAP_ADDR, U256::from(10u64));
        f.swap.set_suspended(true);
        f.tracker.refresh(&f.session, None).await;

        let outcome = f.flow.buy(&f.session, U256::from(30u64)).await;
        assert!(outcome.is_completed());
        assert_eq!(f.spend.approve_calls(), vec![(SWAP_ADDR, U256::MAX)]);
        assert!(f.delegates.query_calls().is_empty());
        assert_eq!(f.swap.swap_calls(), vec![(U256::from(30u64), false)]);
        assert!(!f.flow.is_pending());
    }

    #[tokio::test]
    async fn test_approval_failure_aborts_before_swap() {
        let mut f = fixture().await;
        f.spend
            .fail_next_approve(ChainError::Rejected("user denied".to_string()));
        f.delegates.grant(ACCOUNT, SWAP_ADDR);

        let outcome = f.flow.buy(&f.session, U256::from(30u64)).await;
        assert!(matches!(
            outcome,
            PurchaseOutcome::Failed {
                stage: FailStage::Approval,
                ..
            }
        ));
        assert!(f.swap.swap_calls().is_empty());
        assert!(f.delegates.query_calls().is_empty());
        assert!(!f.flow.is_pending());

        let statuses = f.drain_statuses();
        assert!(statuses
            .iter()
            .any(|s| matches!(s, StatusUpdate::Failed { .. })));
    }

    #[tokio::test]
    async fn test_missing_delegation_is_requested() {
        let f = fixture().await;
        f.spend.set_allowance(ACCOUNT, SWAP_ADDR, U256::from(50u64));

        let outcome = f.flow.buy(&f.session, U256::from(30u64)).await;
        assert!(outcome.is_completed());
        assert_eq!(f.delegates.approve_calls(), vec![SWAP_ADDR]);
        assert_eq!(f.swap.swap_calls(), vec![(U256::from(30u64), true)]);
    }

    #[tokio::test]
    async fn test_delegate_rejection_aborts() {
        let f = fixture().await;
        f.spend.set_allowance(ACCOUNT, SWAP_ADDR, U256::from(50u64));
        f.delegates
            .fail_next_approve(ChainError::Rejected("user denied".to_string()));

        let outcome = f.flow.buy(&f.session, U256::from(30u64)).await;
        assert!(matches!(
            outcome,
            PurchaseOutcome::Failed {
                stage: FailStage::DelegateApproval,
                ..
            }
        ));
        assert!(f.swap.swap_calls().is_empty());
        assert!(!f.flow.is_pending());
    }

    #[tokio::test]
    async fn test_confirmation_failure_reported_distinctly() {
        let mut f = fixture().await;
        f.spend.set_allowance(ACCOUNT, SWAP_ADDR, U256::from(50u64));
        f.delegates.grant(ACCOUNT, SWAP_ADDR);
        f.swap
            .set_confirm_result(Err(ChainError::Rpc("dropped from mempool".to_string())));

        let outcome = f.flow.buy(&f.session, U256::from(30u64)).await;
        assert!(matches!(
            outcome,
            PurchaseOutcome::Failed {
                stage: FailStage::Confirmation,
                ..
            }
        ));
        assert!(!f.flow.is_pending());

        // Pending was reported before the failure
        let statuses = f.drain_statuses();
        assert!(statuses
            .iter()
            .any(|s| matches!(s, StatusUpdate::SwapPending { .. })));
        assert!(statuses
            .iter()
            .any(|s| matches!(s, StatusUpdate::Failed { .. })));
    }

    #[tokio::test]
    async fn test_nonce_failure_gets_reset_hint() {
        let mut f = fixture().await;
        f.spend.set_allowance(ACCOUNT, SWAP_ADDR, U256::from(50u64));
        f.delegates.grant(ACCOUNT, SWAP_ADDR);
        f.swap
            .fail_next_swap(ChainError::Rpc("nonce too low".to_string()));

        let outcome = f.flow.buy(&f.session, U256::from(30u64)).await;
        assert!(matches!(
            outcome,
            PurchaseOutcome::Failed {
                stage: FailStage::Submission,
                ..
            }
        ));

        let statuses = f.drain_statuses();
        assert!(statuses.iter().any(|s| matches!(
            s,
            StatusUpdate::Failed { message } if message.contains("resetting your wallet account")
        )));
    }

    #[tokio::test]
    async fn test_second_buy_rejected_while_first_in_flight() {
        let f = fixture().await;
        f.spend.set_allowance(ACCOUNT, SWAP_ADDR, U256::from(50u64));
        f.delegates.grant(ACCOUNT, SWAP_ADDR);
        let gate = f.swap.hold_confirmations();

        let flow = Arc::new(f.flow);
        let first = tokio::spawn({
            let flow = flow.clone();
            let session = f.session.clone();
            async move { flow.buy(&session, U256::from(30u64)).await }
        });

        // Wait until the first purchase holds the latch
        while !flow.is_pending() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let second = flow.buy(&f.session, U256::from(30u64)).await;
        assert!(matches!(
            second,
            PurchaseOutcome::Rejected {
                reason: RejectReason::PurchaseInFlight
            }
        ));
        assert_eq!(f.swap.swap_calls().len(), 1);

        gate.notify_one();
        let outcome = first.await.unwrap();
        assert!(outcome.is_completed());
        assert!(!flow.is_pending());
    }

    #[tokio::test]
    async fn test_estimate_uses_market_flag_and_degrades_to_zero() {
        let f = fixture().await;
        f.swap.set_estimate(Ok(U256::from(7u64)));
        assert_eq!(
            f.flow.estimate_return(&f.session, U256::from(30u64)).await,
            U256::from(7u64)
        );
        assert_eq!(f.swap.estimate_calls(), vec![(U256::from(30u64), true)]);

        // Market closes: the flag flips on the next estimate
        f.swap.set_suspended(true);
        f.tracker.refresh(&f.session, None).await;
        f.swap.set_estimate(Ok(U256::from(7u64)));
        f.flow.estimate_return(&f.session, U256::from(30u64)).await;
        assert_eq!(f.swap.estimate_calls()[1], (U256::from(30u64), false));

        // Estimation failure resets the displayed value to zero
        f.swap
            .set_estimate(Err(ChainError::Rpc("node flake".to_string())));
        assert_eq!(
            f.flow.estimate_return(&f.session, U256::from(30u64)).await,
            U256::ZERO
        );
    }
}
