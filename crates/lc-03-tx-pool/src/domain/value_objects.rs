//! Value objects for ordering pooled transactions.

use super::entities::{Hash, Timestamp, U256};
use shared_crypto::Keccak256Hasher;
use std::cmp::Ordering;

/// Eviction order: lowest fee first, then newest first, then hash.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeeKey {
    pub fee: U256,
    pub added_at: Timestamp,
    pub hash: Hash,
}

impl FeeKey {
    pub fn new(fee: U256, added_at: Timestamp, hash: Hash) -> Self {
        Self {
            fee,
            added_at,
            hash,
        }
    }
}

impl Ord for FeeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fee
            .cmp(&other.fee)
            .then_with(|| other.added_at.cmp(&self.added_at))
            .then_with(|| self.hash.cmp(&other.hash))
    }
}

impl PartialOrd for FeeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Tie-break key for block selection: `keccak(seed || tx_hash)`.
///
/// The seed is the parent block hash, so any validator can reproduce the
/// ordering while a sender cannot choose its position by picking a fee.
pub fn seeded_rank(seed: &Hash, tx_hash: &Hash) -> Hash {
    let mut hasher = Keccak256Hasher::new();
    hasher.update(seed).update(tx_hash);
    hasher.finalize()
}

/// A sender's next ready transaction, competing for the next block slot.
///
/// Max-heap order: higher fee first, then lower seeded rank.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DrainCandidate {
    pub fee: U256,
    pub rank: Hash,
    pub hash: Hash,
}

impl Ord for DrainCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fee
            .cmp(&other.fee)
            .then_with(|| other.rank.cmp(&self.rank))
            .then_with(|| other.hash.cmp(&self.hash))
    }
}

impl PartialOrd for DrainCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
