//! Core domain entities for the transaction pool.

pub use shared_types::{Address, Hash, SignedTransaction, U256};

/// Timestamp in milliseconds since UNIX epoch.
pub type Timestamp = u64;

/// Pool limits.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Maximum number of transactions held.
    pub max_transactions: usize,
    /// Maximum transactions held per sender.
    pub max_per_sender: usize,
    /// How far past the sender's state nonce a transaction may be queued.
    pub max_nonce_gap: u64,
    /// Minimum fee increase (percent) for replacing a same-nonce transaction.
    pub rbf_min_bump_percent: u64,
    /// Maximum encoded size of a single transaction.
    pub max_tx_bytes: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_transactions: 5000,
            max_per_sender: 64,
            max_nonce_gap: 64,
            rbf_min_bump_percent: 10,
            max_tx_bytes: 128 * 1024,
        }
    }
}

impl PoolConfig {
    /// Small limits for tests.
    pub fn for_testing() -> Self {
        Self {
            max_transactions: 16,
            max_per_sender: 8,
            max_nonce_gap: 8,
            ..Self::default()
        }
    }
}

/// A transaction held by the pool, with cached metadata.
#[derive(Clone, Debug)]
pub struct PooledTransaction {
    pub transaction: SignedTransaction,
    pub hash: Hash,
    pub sender: Address,
    pub nonce: u64,
    pub fee: U256,
    pub size: u64,
    /// Timestamp when added to the pool (ms).
    pub added_at: Timestamp,
}

impl PooledTransaction {
    pub fn new(transaction: SignedTransaction, added_at: Timestamp) -> Self {
        Self {
            hash: transaction.hash(),
            sender: transaction.from,
            nonce: transaction.nonce,
            fee: transaction.fee,
            size: transaction.size_bytes(),
            transaction,
            added_at,
        }
    }
}

/// Where an accepted transaction landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Contiguous with the sender's state nonce; eligible for the next block.
    Ready,
    /// Ahead of a nonce gap; held until the gap fills.
    Queued,
}

/// Snapshot of pool occupancy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStatus {
    pub total: usize,
    pub ready: usize,
    pub queued: usize,
    pub senders: usize,
    pub total_bytes: u64,
}
