//! Consensus configuration.

use shared_types::U256;

/// Dynamic block size parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockSizeConfig {
    /// Blocks between limit recalculations.
    pub adjustment_interval: u64,
    /// New limit as a percentage of the trailing window's average size.
    pub adjustment_percent: u64,
    /// The limit never drops below this.
    pub min_block_size: u64,
    /// Limit until the first full window exists.
    pub initial_block_size: u64,
}

impl Default for BlockSizeConfig {
    fn default() -> Self {
        Self {
            adjustment_interval: 10,
            adjustment_percent: 120,
            min_block_size: 100_000,
            initial_block_size: 1_000_000,
        }
    }
}

/// Consensus configuration
#[derive(Clone, Debug)]
pub struct ConsensusConfig {
    /// Credited to the producer of every block, on top of fees.
    pub base_reward: U256,
    pub block_size: BlockSizeConfig,
    /// Permanently rejected block hashes remembered before the least recently
    /// seen is forgotten.
    pub rejected_cache_size: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            base_reward: U256::from(50u64),
            block_size: BlockSizeConfig::default(),
            rejected_cache_size: 4096,
        }
    }
}

impl ConsensusConfig {
    /// Small windows and limits so adjustments show up in short test chains.
    pub fn for_testing() -> Self {
        Self {
            base_reward: U256::from(50u64),
            block_size: BlockSizeConfig {
                adjustment_interval: 2,
                adjustment_percent: 120,
                min_block_size: 2_000,
                initial_block_size: 20_000,
            },
            rejected_cache_size: 16,
        }
    }
}
