//! # Genesis Block Builder
//!
//! Builds block 0 from programmatic allocations.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use lc_01_state_trie::StateDb;
use lc_04_consensus::{build_genesis, ConsensusError};
use shared_types::{Account, Address, Block, ErrorClass, ErrorKind, U256};
use thiserror::Error;
use tracing::info;

/// Genesis block creation errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    /// Invalid genesis configuration.
    #[error("Invalid genesis configuration: {0}")]
    InvalidConfig(String),

    /// State initialization failed.
    #[error("Failed to initialize genesis state: {0}")]
    StateInitFailed(#[from] ConsensusError),
}

impl ErrorClass for GenesisError {
    fn kind(&self) -> ErrorKind {
        match self {
            GenesisError::InvalidConfig(_) => ErrorKind::Malformed,
            GenesisError::StateInitFailed(e) => e.kind(),
        }
    }
}

/// Genesis block configuration.
#[derive(Debug, Clone, Default)]
pub struct GenesisConfig {
    /// Genesis timestamp (Unix seconds).
    /// If None, uses current time.
    pub timestamp: Option<u64>,

    /// Accounts present at height 0.
    pub allocations: Vec<Account>,
}

impl GenesisConfig {
    /// Plain accounts funded with the given balances.
    pub fn with_balances(balances: impl IntoIterator<Item = (Address, U256)>) -> Self {
        Self {
            timestamp: Some(0),
            allocations: balances
                .into_iter()
                .map(|(address, balance)| Account::with_balance(address, balance))
                .collect(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), GenesisError> {
        let mut seen = HashSet::new();
        for account in &self.allocations {
            if !seen.insert(account.address) {
                return Err(GenesisError::InvalidConfig(format!(
                    "duplicate allocation for {}",
                    hex::encode(account.address)
                )));
            }
            if account.nonce != 0 {
                return Err(GenesisError::InvalidConfig(format!(
                    "allocation {} starts at nonce {}",
                    hex::encode(account.address),
                    account.nonce
                )));
            }
        }
        Ok(())
    }
}

/// Builder for the genesis block.
pub struct GenesisBuilder {
    config: GenesisConfig,
}

impl GenesisBuilder {
    pub fn new(config: GenesisConfig) -> Self {
        Self { config }
    }

    /// Writes the allocations into `state` and returns the genesis block.
    pub fn build(&self, state: &StateDb) -> Result<Block, GenesisError> {
        self.config.validate()?;

        let timestamp = self.config.timestamp.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });

        let genesis = build_genesis(state, &self.config.allocations, timestamp)?;
        info!(
            hash = %hex::encode(genesis.hash()),
            accounts = self.config.allocations.len(),
            "genesis block built"
        );
        Ok(genesis)
    }
}
