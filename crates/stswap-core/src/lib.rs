//! Core helpers for the stswap client.
//!
//! This crate provides the pure, I/O-free pieces shared by the rest of
//! the workspace:
//! - `format_units` / `parse_units`: conversion between raw ERC-20
//!   integer amounts and fixed-precision decimal strings
//! - `truncate_address`: shortened address rendering for display

pub mod error;
pub mod format;

pub use error::{CoreError, CoreResult};
pub use format::{format_units, parse_units, truncate_address};
