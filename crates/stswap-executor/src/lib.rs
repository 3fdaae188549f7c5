//! Purchase orchestration for the stswap client.
//!
//! `PurchaseFlow` sequences a buy: balance and amount checks, the
//! conditional ERC-20 spending approval, the conditional delegated-
//! trading approval, swap submission and the confirmation wait, with
//! a re-entrancy latch that is cleared on every exit path and one
//! user-facing status message per phase.

pub mod purchase;
pub mod status;

pub use purchase::{FailStage, PurchaseFlow, PurchaseOutcome, RejectReason};
pub use status::{failure_message, StatusUpdate};
