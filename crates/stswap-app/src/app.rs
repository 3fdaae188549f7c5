//! Main application wiring.
//!
//! One cooperative loop multiplexes three inputs: provider events
//! (blocks, account and network changes), purchase status updates, and
//! user commands from stdin. Purchases run as spawned tasks against a
//! session snapshot so block-driven balance refreshes keep flowing
//! while a swap is pending.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use alloy::primitives::U256;
use std::sync::Arc;
use stswap_chain::{ChainEvent, DynWalletProvider};
use stswap_core::{format_units, parse_units, truncate_address, CoreResult};
use stswap_executor::{PurchaseFlow, StatusUpdate};
use stswap_session::{BalanceTracker, SessionManager};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

/// Main application.
pub struct Application {
    config: AppConfig,
    manager: SessionManager,
    tracker: Arc<BalanceTracker>,
    flow: Arc<PurchaseFlow>,
    status_rx: mpsc::UnboundedReceiver<StatusUpdate>,
}

impl Application {
    /// Assemble the application around a wallet provider.
    #[must_use]
    pub fn new(config: AppConfig, provider: DynWalletProvider) -> Self {
        let manager = SessionManager::new(provider, config.address_book());
        let tracker = Arc::new(BalanceTracker::new());
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let flow = Arc::new(PurchaseFlow::new(tracker.clone(), status_tx));

        Self {
            config,
            manager,
            tracker,
            flow,
            status_rx,
        }
    }

    /// Connect the wallet and run the event/command loop until the
    /// user quits or stdin closes.
    pub async fn run(self) -> AppResult<()> {
        let Application {
            config,
            mut manager,
            tracker,
            flow,
            mut status_rx,
        } = self;

        manager.connect().await?;
        if let Some(session) = manager.session() {
            tracker.refresh(session, None).await;
        }
        print_balances(&config, &manager, &tracker);

        let mut events = manager
            .take_events()
            .ok_or_else(|| AppError::Config("event channel already taken".to_string()))?;

        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        println!("commands: balances | estimate <amount> | buy <amount> | quit");

        loop {
            tokio::select! {
                Some(event) = events.recv() => {
                    handle_chain_event(&mut manager, &tracker, event).await;
                }
                Some(update) = status_rx.recv() => {
                    println!("{update}");
                }
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if !handle_command(&config, &manager, &tracker, &flow, line.trim()).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        info!("Shutting down");
        Ok(())
    }
}

async fn handle_chain_event(
    manager: &mut SessionManager,
    tracker: &BalanceTracker,
    event: ChainEvent,
) {
    match event {
        ChainEvent::NewBlock(number) => {
            if let Some(session) = manager.session() {
                tracker.refresh(session, Some(number)).await;
            }
        }
        ChainEvent::NetworkChanged(network) => {
            info!(network = %network, "Provider network changed");
            match manager.handle_network_change(network).await {
                Ok(()) => {
                    if let Some(session) = manager.session() {
                        tracker.refresh(session, None).await;
                    }
                }
                Err(e) => {
                    tracker.clear();
                    println!("{e}");
                }
            }
        }
        ChainEvent::AccountsChanged(accounts) => {
            match manager.handle_accounts_change(accounts) {
                Some(_) => {
                    if let Some(session) = manager.session() {
                        tracker.refresh(session, None).await;
                    }
                }
                None => tracker.clear(),
            }
        }
    }
}

/// Dispatch one user command. Returns false when the loop should end.
async fn handle_command(
    config: &AppConfig,
    manager: &SessionManager,
    tracker: &BalanceTracker,
    flow: &Arc<PurchaseFlow>,
    line: &str,
) -> bool {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return true;
    };

    match command {
        "balances" => {
            if let Some(session) = manager.session() {
                tracker.refresh(session, None).await;
            }
            print_balances(config, manager, tracker);
        }
        "estimate" => {
            let Some(session) = manager.session() else {
                println!("not connected");
                return true;
            };
            match parse_amount(parts.next(), session.contracts.spend_decimals) {
                Ok(amount) => {
                    let expected = flow.estimate_return(session, amount).await;
                    println!(
                        "expected return: {} sTSLA",
                        format_units(
                            expected,
                            session.contracts.target_decimals.into(),
                            config.display_decimals
                        )
                    );
                }
                Err(e) => println!("{e}"),
            }
        }
        "buy" => {
            let Some(session) = manager.session() else {
                println!("not connected");
                return true;
            };
            match parse_amount(parts.next(), session.contracts.spend_decimals) {
                Ok(amount) => {
                    // Snapshot the session and run the purchase as its
                    // own cooperative task; status updates arrive over
                    // the channel, and re-entrancy is latched inside
                    // the flow.
                    let flow = flow.clone();
                    let session = session.clone();
                    tokio::spawn(async move {
                        flow.buy(&session, amount).await;
                    });
                }
                Err(e) => println!("{e}"),
            }
        }
        "quit" | "exit" => return false,
        other => println!("unknown command: {other}"),
    }

    true
}

fn parse_amount(text: Option<&str>, decimals: u8) -> CoreResult<U256> {
    parse_units(text.unwrap_or(""), decimals.into())
}

fn print_balances(config: &AppConfig, manager: &SessionManager, tracker: &BalanceTracker) {
    let Some(session) = manager.session() else {
        println!("not connected");
        return;
    };
    let snapshot = tracker.snapshot();
    println!(
        "account {} | USDC {} | sTSLA {} | market {}",
        truncate_address(&session.account.to_string(), 8, 8),
        format_units(
            snapshot.spend_balance,
            session.contracts.spend_decimals.into(),
            config.display_decimals
        ),
        format_units(
            snapshot.target_balance,
            session.contracts.target_decimals.into(),
            config.display_decimals
        ),
        if snapshot.market_open { "open" } else { "suspended" },
    );
}
