//! Network address resolution for the stswap client.
//!
//! Maps a provider-reported network identifier to the fixed set of
//! contract addresses deployed on that network. Pure lookup, no I/O;
//! a miss is a first-class `None` the caller must handle by aborting
//! connection setup.

pub mod address_book;

pub use address_book::{AddressBook, AddressSet, MAINNET_FORK, UNRECOGNIZED_NETWORK};
