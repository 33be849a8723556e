//! Application configuration loaded from environment variables.

use crate::errors::{RegistryError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Soroban RPC endpoint (e.g. https://soroban-testnet.stellar.org)
    pub rpc_url: String,
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// How often (in seconds) to poll the RPC for new events
    pub poll_interval_secs: u64,
    /// Maximum number of events to fetch per RPC request
    pub events_per_page: u32,
    /// Ledger to start from if no cursor is saved
    pub start_ledger: u32,
    /// How far behind the cursor to backfill a contract registered without
    /// its deployment ledger
    pub backfill_ledgers: u32,
    /// Addresses seeded as governments at startup
    pub government_addresses: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            rpc_url: env_var("RPC_URL")
                .unwrap_or_else(|_| "https://soroban-testnet.stellar.org".to_string()),
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./subsidy_registry.db".to_string()),
            api_port: parse_var("API_PORT", "3001")?,
            poll_interval_secs: parse_var("POLL_INTERVAL_SECS", "5")?,
            events_per_page: parse_var("EVENTS_PER_PAGE", "100")?,
            start_ledger: parse_var("START_LEDGER", "0")?,
            backfill_ledgers: parse_var("BACKFILL_LEDGERS", "720")?,
            government_addresses: split_list(&env_var("GOVERNMENT_ADDRESSES").unwrap_or_default()),
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| RegistryError::Config(format!("Missing env var: {key}")))
}

fn parse_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T> {
    env_var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| RegistryError::Config(format!("Invalid {key}")))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
