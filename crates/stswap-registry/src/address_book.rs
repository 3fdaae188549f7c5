//! Static network → contract-address table.
//!
//! Each supported network carries exactly four addresses: the spend
//! token (USDC), the target token (sTSLA), the swap contract, and the
//! Synthetix delegate-approval registry. The table is exact-match on
//! the network identifier the wallet provider reports, with one alias
//! hop so the identifier used for unrecognized chains resolves to the
//! designated local fork.

use alloy::primitives::{address, Address};
use serde::Deserialize;
use std::collections::HashMap;

/// Network identifier a provider reports for a chain it does not
/// recognize (local forks, dev chains).
pub const UNRECOGNIZED_NETWORK: &str = "unknown";

/// The designated mainnet-fork network that [`UNRECOGNIZED_NETWORK`]
/// aliases to.
pub const MAINNET_FORK: &str = "homestead_fork";

/// Contract address set for one network.
///
/// Deserializable so config files can add or override networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AddressSet {
    /// Spend currency (USDC).
    pub spend_token: Address,
    /// Target currency (sTSLA).
    pub target_token: Address,
    /// Swap contract.
    pub swap: Address,
    /// Delegated-trading approval registry.
    pub delegate_approvals: Address,
}

/// Exact-match address table keyed by network identifier.
#[derive(Debug, Clone)]
pub struct AddressBook {
    networks: HashMap<String, AddressSet>,
    aliases: HashMap<String, String>,
}

impl AddressBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            networks: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// The built-in table.
    ///
    /// The swap contract is only deployed on the mainnet fork, so that
    /// is the single built-in entry; additional networks come from
    /// config overrides via [`AddressBook::merge`].
    #[must_use]
    pub fn builtin() -> Self {
        let mut book = Self::new();
        book.insert(
            MAINNET_FORK,
            AddressSet {
                spend_token: address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
                target_token: address!("918da91ccbc32b7a6a0cc4ecd5987bbab6e31e6d"),
                swap: address!("3aa5ebb10dc797cac828524e59a333d0a371443c"),
                delegate_approvals: address!("15fd6e554874b9e70f832ed37f231ac5e142362f"),
            },
        );
        book.add_alias(UNRECOGNIZED_NETWORK, MAINNET_FORK);
        book
    }

    /// Resolve a network identifier to its address set.
    ///
    /// Follows one alias hop. Absence is a plain `None`; callers abort
    /// connection setup and report the unsupported network.
    #[must_use]
    pub fn resolve(&self, network: &str) -> Option<&AddressSet> {
        if let Some(set) = self.networks.get(network) {
            return Some(set);
        }
        self.aliases
            .get(network)
            .and_then(|target| self.networks.get(target))
    }

    /// Best-effort human-friendly name for a network identifier, for
    /// unsupported-network error messages. Falls back to the raw
    /// identifier.
    #[must_use]
    pub fn display_name(&self, network: &str) -> String {
        match network {
            "homestead" => "Ethereum Mainnet".to_string(),
            "goerli" => "Goerli Testnet".to_string(),
            "sepolia" => "Sepolia Testnet".to_string(),
            "matic" => "Polygon".to_string(),
            "arbitrum" => "Arbitrum One".to_string(),
            "optimism" => "Optimism".to_string(),
            "base" => "Base".to_string(),
            MAINNET_FORK => "local mainnet fork".to_string(),
            UNRECOGNIZED_NETWORK => "unrecognized network".to_string(),
            other => other.to_string(),
        }
    }

    /// Add or replace a network entry.
    pub fn insert(&mut self, network: impl Into<String>, set: AddressSet) {
        self.networks.insert(network.into(), set);
    }

    /// Add an alias from one identifier to another.
    pub fn add_alias(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.aliases.insert(from.into(), to.into());
    }

    /// Merge config-provided entries, overriding built-ins on conflict.
    pub fn merge(&mut self, overrides: HashMap<String, AddressSet>) {
        self.networks.extend(overrides);
    }

    /// Number of configured networks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// Check if no networks are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

impl Default for AddressBook {
    fn default() -> Self {
        Self::builtin()
    }
}
