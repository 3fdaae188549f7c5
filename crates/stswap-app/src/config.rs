//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use stswap_registry::{AddressBook, AddressSet};

/// Application configuration, loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// JSON-RPC endpoint of the node the wallet signs against.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Block polling interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Fractional digits shown for balances and estimates.
    #[serde(default = "default_display_decimals")]
    pub display_decimals: usize,

    /// Extra or overriding network entries for the address book.
    #[serde(default)]
    pub networks: HashMap<String, AddressSet>,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_display_decimals() -> usize {
    2
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            poll_interval_ms: default_poll_interval_ms(),
            display_decimals: default_display_decimals(),
            networks: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location.
    ///
    /// Uses `STSWAP_CONFIG` when set, otherwise `config/default.toml`;
    /// falls back to defaults when the file does not exist.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("STSWAP_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Build the address book: built-in entries plus config overrides.
    #[must_use]
    pub fn address_book(&self) -> AddressBook {
        let mut book = AddressBook::builtin();
        book.merge(self.networks.clone());
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stswap_registry::MAINNET_FORK;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.poll_interval_ms, 2_000);
        assert_eq!(config.display_decimals, 2);
        assert!(config.networks.is_empty());
    }

    #[test]
    fn test_parse_minimal() {
        let config: AppConfig = toml::from_str("rpc_url = \"http://10.0.0.1:8545\"").unwrap();
        assert_eq!(config.rpc_url, "http://10.0.0.1:8545");
        assert_eq!(config.poll_interval_ms, 2_000);
    }

    #[test]
    fn test_parse_network_override() {
        let toml_text = r#"
            rpc_url = "http://127.0.0.1:8545"

            [networks.homestead]
            spend_token = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
            target_token = "0x918da91ccbc32b7a6a0cc4ecd5987bbab6e31e6d"
            swap = "0x3aa5ebb10dc797cac828524e59a333d0a371443c"
            delegate_approvals = "0x15fd6e554874b9e70f832ed37f231ac5e142362f"
        "#;
        let config: AppConfig = toml::from_str(toml_text).unwrap();

        let book = config.address_book();
        assert!(book.resolve("homestead").is_some());
        // Built-in fork entry still present
        assert!(book.resolve(MAINNET_FORK).is_some());
    }
}
