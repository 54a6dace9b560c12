//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//! Every field has a default; `LEDGER_*` environment variables override them.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LEDGER_CONFIRMATIONS` | `finality.confirmation_threshold` |
//! | `LEDGER_BASE_REWARD` | `consensus.base_reward` (decimal) |
//! | `LEDGER_MIN_BLOCK_SIZE` | `consensus.block_size.min_block_size` |
//! | `LEDGER_INITIAL_BLOCK_SIZE` | `consensus.block_size.initial_block_size` |
//! | `LEDGER_POOL_MAX_TXS` | `pool.max_transactions` |
//! | `LEDGER_PRODUCER` | `producer.address` (hex) |
//! | `LEDGER_BLOCK_INTERVAL_MS` | `producer.block_interval` |
//! | `LEDGER_FETCH_TIMEOUT_MS` | `fetch.attempt_timeout` |
//! | `LEDGER_WRITER_TIMEOUT_MS` | `writer_timeout` |
//! | `LEDGER_GENESIS_TIMESTAMP` | `genesis.timestamp` |
//! | `LEDGER_GENESIS_ALLOC` | `genesis.allocations`, as `addr=balance,...` |

use std::str::FromStr;
use std::time::Duration;

use lc_01_state_trie::TrieConfig;
use lc_03_tx_pool::{GossipConfig, PoolConfig};
use lc_04_consensus::ConsensusConfig;
use lc_05_finality::FinalityConfig;
use shared_types::{Account, Address, U256};
use thiserror::Error;

use crate::adapters::FetchConfig;
use crate::genesis::GenesisConfig;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub trie: TrieConfig,
    pub pool: PoolConfig,
    pub gossip: GossipConfig,
    pub consensus: ConsensusConfig,
    pub finality: FinalityConfig,
    pub fetch: FetchConfig,
    pub genesis: GenesisConfig,
    pub producer: ProducerConfig,
    /// Longest a mutation waits for the writer before failing unavailable.
    pub writer_timeout: Duration,
    /// Events buffered per subscriber.
    pub event_capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            trie: TrieConfig::default(),
            pool: PoolConfig::default(),
            gossip: GossipConfig::default(),
            consensus: ConsensusConfig::default(),
            finality: FinalityConfig::default(),
            fetch: FetchConfig::default(),
            genesis: GenesisConfig::default(),
            producer: ProducerConfig::default(),
            writer_timeout: Duration::from_secs(10),
            event_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Block production configuration.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Receives block rewards and fees.
    pub address: Address,
    pub block_interval: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            address: [0u8; 20],
            block_interval: Duration::from_secs(5),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl NodeConfig {
    /// Small limits and a finality threshold of 6 for end-to-end tests.
    pub fn for_testing(genesis: GenesisConfig) -> Self {
        Self {
            pool: PoolConfig::for_testing(),
            gossip: GossipConfig::for_testing(),
            consensus: ConsensusConfig::for_testing(),
            fetch: FetchConfig::for_testing(),
            genesis,
            writer_timeout: Duration::from_secs(1),
            event_capacity: 256,
            ..Self::default()
        }
    }

    /// Defaults overridden by `LEDGER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns per variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = parse::<u64>(&lookup, "LEDGER_CONFIRMATIONS")? {
            config.finality.confirmation_threshold = v;
        }
        if let Some(raw) = lookup("LEDGER_BASE_REWARD") {
            config.consensus.base_reward = parse_u256("LEDGER_BASE_REWARD", &raw)?;
        }
        if let Some(v) = parse::<u64>(&lookup, "LEDGER_MIN_BLOCK_SIZE")? {
            config.consensus.block_size.min_block_size = v;
        }
        if let Some(v) = parse::<u64>(&lookup, "LEDGER_INITIAL_BLOCK_SIZE")? {
            config.consensus.block_size.initial_block_size = v;
        }
        if let Some(v) = parse::<usize>(&lookup, "LEDGER_POOL_MAX_TXS")? {
            config.pool.max_transactions = v;
        }
        if let Some(raw) = lookup("LEDGER_PRODUCER") {
            config.producer.address = parse_address("LEDGER_PRODUCER", &raw)?;
        }
        if let Some(ms) = parse::<u64>(&lookup, "LEDGER_BLOCK_INTERVAL_MS")? {
            config.producer.block_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&lookup, "LEDGER_FETCH_TIMEOUT_MS")? {
            config.fetch.attempt_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&lookup, "LEDGER_WRITER_TIMEOUT_MS")? {
            config.writer_timeout = Duration::from_millis(ms);
        }
        if let Some(ts) = parse::<u64>(&lookup, "LEDGER_GENESIS_TIMESTAMP")? {
            config.genesis.timestamp = Some(ts);
        }
        if let Some(raw) = lookup("LEDGER_GENESIS_ALLOC") {
            config.genesis.allocations = parse_allocations(&raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no ledger can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &'static str, value: String, reason: &str| ConfigError::Invalid {
            key,
            value,
            reason: reason.into(),
        };
        if self.consensus.block_size.adjustment_interval == 0 {
            return Err(invalid(
                "consensus.block_size.adjustment_interval",
                "0".into(),
                "must be positive",
            ));
        }
        if self.consensus.block_size.min_block_size == 0 {
            return Err(invalid(
                "LEDGER_MIN_BLOCK_SIZE",
                "0".into(),
                "must be positive",
            ));
        }
        if self.writer_timeout.is_zero() {
            return Err(invalid(
                "LEDGER_WRITER_TIMEOUT_MS",
                "0".into(),
                "must be positive",
            ));
        }
        Ok(())
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_u256(key: &'static str, raw: &str) -> Result<U256, ConfigError> {
    U256::from_dec_str(raw.trim()).map_err(|e| ConfigError::Invalid {
        key,
        value: raw.into(),
        reason: format!("{e:?}"),
    })
}

fn parse_address(key: &'static str, raw: &str) -> Result<Address, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key,
        value: raw.into(),
        reason,
    };
    let bytes = hex::decode(raw.trim().trim_start_matches("0x")).map_err(|e| invalid(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| invalid(format!("{} bytes, expected 20", b.len())))
}

fn parse_allocations(raw: &str) -> Result<Vec<Account>, ConfigError> {
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            let (address, balance) = entry.split_once('=').ok_or_else(|| ConfigError::Invalid {
                key: "LEDGER_GENESIS_ALLOC",
                value: entry.into(),
                reason: "expected address=balance".into(),
            })?;
            Ok(Account::with_balance(
                parse_address("LEDGER_GENESIS_ALLOC", address)?,
                parse_u256("LEDGER_GENESIS_ALLOC", balance)?,
            ))
        })
        .collect()
}
