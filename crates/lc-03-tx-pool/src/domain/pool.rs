//! # Transaction Pool
//!
//! ## Data Structures
//!
//! - `by_hash`: O(1) lookup by transaction hash
//! - `by_fee`: eviction order (BTreeSet, lowest fee first)
//! - `by_sender`: nonce-ordered transactions per account, plus the sender's
//!   on-chain nonce as last observed
//!
//! ## Ready vs Queued
//!
//! A transaction is *ready* when every nonce from the sender's state nonce
//! up to its own is present. Anything past a gap is *queued*: held, but never
//! selected for a block until the gap fills.

use super::entities::{
    Address, Hash, Placement, PoolConfig, PoolStatus, PooledTransaction, SignedTransaction,
    Timestamp, U256,
};
use super::errors::PoolError;
use super::value_objects::{seeded_rank, DrainCandidate, FeeKey};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};
use tracing::{debug, trace};

#[derive(Debug)]
struct SenderQueue {
    /// Sender nonce on the canonical state as last observed.
    state_nonce: u64,
    txs: BTreeMap<u64, Hash>,
}

impl SenderQueue {
    fn new(state_nonce: u64) -> Self {
        Self {
            state_nonce,
            txs: BTreeMap::new(),
        }
    }

    /// Length of the contiguous run starting at the state nonce.
    fn ready_len(&self) -> usize {
        self.txs
            .keys()
            .zip(self.state_nonce..)
            .take_while(|(nonce, expected)| **nonce == *expected)
            .count()
    }

    fn is_ready(&self, nonce: u64) -> bool {
        nonce >= self.state_nonce
            && (self.state_nonce..=nonce).all(|n| self.txs.contains_key(&n))
    }
}

/// Transaction pool with multiple indices.
///
/// INVARIANTS:
/// - No duplicate transaction hashes
/// - At most one transaction per (sender, nonce)
/// - No transaction with a nonce below its sender's observed state nonce
#[derive(Debug)]
pub struct TransactionPool {
    config: PoolConfig,
    by_hash: HashMap<Hash, PooledTransaction>,
    by_fee: BTreeSet<FeeKey>,
    by_sender: HashMap<Address, SenderQueue>,
    total_bytes: u64,
}

impl TransactionPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            by_hash: HashMap::new(),
            by_fee: BTreeSet::new(),
            by_sender: HashMap::new(),
            total_bytes: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PoolConfig::default())
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn get(&self, hash: &Hash) -> Option<&PooledTransaction> {
        self.by_hash.get(hash)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Next nonce the sender should use, counting ready pool transactions.
    pub fn next_nonce(&self, sender: &Address) -> Option<u64> {
        self.by_sender
            .get(sender)
            .map(|q| q.state_nonce + q.ready_len() as u64)
    }

    /// Adds a transaction, given the sender's current on-chain nonce.
    ///
    /// A `state_nonce` below the one the pool already observed for the sender
    /// (a read from before a block commit) does not move the sender back: the
    /// higher value is used.
    ///
    /// # Errors
    /// - `Oversized` if the encoded transaction is too large
    /// - `DuplicateTransaction` if the hash is already pooled
    /// - `StaleNonce` if the nonce was already consumed
    /// - `NonceTooFarAhead` if the nonce gap exceeds the configured maximum
    /// - `InsufficientFeeBump` when replacing a same-nonce transaction too cheaply
    /// - `SenderLimitReached` / `PoolFull` when at capacity
    pub fn submit(
        &mut self,
        tx: SignedTransaction,
        state_nonce: u64,
        now: Timestamp,
    ) -> Result<Placement, PoolError> {
        let entry = PooledTransaction::new(tx, now);
        let state_nonce = self
            .by_sender
            .get(&entry.sender)
            .map_or(state_nonce, |q| q.state_nonce.max(state_nonce));

        if entry.size > self.config.max_tx_bytes {
            return Err(PoolError::Oversized {
                size: entry.size,
                max: self.config.max_tx_bytes,
            });
        }
        if self.by_hash.contains_key(&entry.hash) {
            return Err(PoolError::DuplicateTransaction(entry.hash));
        }
        if entry.nonce < state_nonce {
            return Err(PoolError::StaleNonce {
                expected: state_nonce,
                actual: entry.nonce,
            });
        }
        if entry.nonce - state_nonce > self.config.max_nonce_gap {
            return Err(PoolError::NonceTooFarAhead {
                expected: state_nonce,
                actual: entry.nonce,
                max_gap: self.config.max_nonce_gap,
            });
        }

        self.observe_nonce(entry.sender, state_nonce);

        let sender = entry.sender;
        let nonce = entry.nonce;
        let existing = self
            .by_sender
            .get(&sender)
            .and_then(|q| q.txs.get(&nonce))
            .copied();

        if let Some(existing_hash) = existing {
            self.check_replacement(&existing_hash, &entry)?;
            self.remove_internal(&existing_hash)?;
            debug!(
                old = %hex::encode(existing_hash),
                new = %hex::encode(entry.hash),
                "replaced transaction by fee"
            );
        } else {
            let sender_count = self.by_sender.get(&sender).map_or(0, |q| q.txs.len());
            if sender_count >= self.config.max_per_sender {
                return Err(PoolError::SenderLimitReached {
                    address: sender,
                    limit: self.config.max_per_sender,
                });
            }
            if self.by_hash.len() >= self.config.max_transactions && !self.try_evict_for(&entry)? {
                return Err(PoolError::PoolFull {
                    capacity: self.config.max_transactions,
                });
            }
        }

        self.insert(entry, state_nonce);
        Ok(self.placement(&sender, nonce))
    }

    /// Same-nonce replacement must pay at least the configured bump.
    fn check_replacement(&self, existing: &Hash, new: &PooledTransaction) -> Result<(), PoolError> {
        let old_fee = self
            .by_hash
            .get(existing)
            .map(|tx| tx.fee)
            .ok_or(PoolError::TransactionNotFound(*existing))?;

        let bump = U256::from(100 + self.config.rbf_min_bump_percent);
        let min_fee = old_fee.saturating_mul(bump) / U256::from(100);

        if new.fee < min_fee || new.fee <= old_fee {
            return Err(PoolError::InsufficientFeeBump {
                old_fee,
                new_fee: new.fee,
                min_bump_percent: self.config.rbf_min_bump_percent,
            });
        }
        Ok(())
    }

    /// Makes room for `new_tx` by evicting a transaction that pays strictly
    /// less.
    ///
    /// Eligible transactions go first, lowest fee first. Only the last of a
    /// sender's ready run is a candidate, so the rest of the run stays
    /// eligible. Queued transactions are considered only when no eligible one
    /// is cheaper, and only a sender's highest nonce.
    fn try_evict_for(&mut self, new_tx: &PooledTransaction) -> Result<bool, PoolError> {
        let victim = self
            .eviction_candidate(new_tx.fee, true)
            .or_else(|| self.eviction_candidate(new_tx.fee, false));
        let Some(victim) = victim else {
            return Ok(false);
        };

        self.remove_internal(&victim)?;
        debug!(evicted = %hex::encode(victim), "evicted lowest-fee transaction");
        Ok(true)
    }

    fn eviction_candidate(&self, below: U256, eligible: bool) -> Option<Hash> {
        self.by_fee
            .iter()
            .take_while(|key| key.fee < below)
            .map(|key| key.hash)
            .find(|hash| self.is_run_tail(hash, eligible))
    }

    fn is_run_tail(&self, hash: &Hash, eligible: bool) -> bool {
        let Some(tx) = self.by_hash.get(hash) else {
            return false;
        };
        let Some(queue) = self.by_sender.get(&tx.sender) else {
            return false;
        };
        if eligible {
            let ready = queue.ready_len() as u64;
            ready > 0 && tx.nonce == queue.state_nonce + ready - 1
        } else {
            !queue.is_ready(tx.nonce) && queue.txs.keys().next_back() == Some(&tx.nonce)
        }
    }

    /// `state_nonce` seeds the sender queue if this is its first transaction.
    fn insert(&mut self, entry: PooledTransaction, state_nonce: u64) {
        self.by_fee
            .insert(FeeKey::new(entry.fee, entry.added_at, entry.hash));
        self.by_sender
            .entry(entry.sender)
            .or_insert_with(|| SenderQueue::new(state_nonce))
            .txs
            .insert(entry.nonce, entry.hash);
        self.total_bytes += entry.size;
        trace!(tx = %hex::encode(entry.hash), nonce = entry.nonce, "pooled transaction");
        self.by_hash.insert(entry.hash, entry);
    }

    fn placement(&self, sender: &Address, nonce: u64) -> Placement {
        match self.by_sender.get(sender) {
            Some(q) if q.is_ready(nonce) => Placement::Ready,
            _ => Placement::Queued,
        }
    }

    /// Record the sender's on-chain nonce and drop anything below it.
    fn observe_nonce(&mut self, sender: Address, state_nonce: u64) -> Vec<Hash> {
        let Some(queue) = self.by_sender.get_mut(&sender) else {
            return Vec::new();
        };
        queue.state_nonce = state_nonce;
        let stale: Vec<Hash> = queue
            .txs
            .range(..state_nonce)
            .map(|(_, hash)| *hash)
            .collect();

        for hash in &stale {
            let _ = self.remove_internal(hash);
        }
        stale
    }

    /// Removes a transaction from the pool.
    pub fn remove(&mut self, hash: &Hash) -> Result<PooledTransaction, PoolError> {
        self.remove_internal(hash)
    }

    fn remove_internal(&mut self, hash: &Hash) -> Result<PooledTransaction, PoolError> {
        let tx = self
            .by_hash
            .remove(hash)
            .ok_or(PoolError::TransactionNotFound(*hash))?;

        self.by_fee
            .remove(&FeeKey::new(tx.fee, tx.added_at, tx.hash));
        self.total_bytes -= tx.size;

        if let Some(queue) = self.by_sender.get_mut(&tx.sender) {
            if queue.txs.get(&tx.nonce) == Some(&tx.hash) {
                queue.txs.remove(&tx.nonce);
            }
            if queue.txs.is_empty() {
                self.by_sender.remove(&tx.sender);
            }
        }

        Ok(tx)
    }

    /// Removes transactions included in a block, along with any other pooled
    /// transaction their inclusion made stale. Returns how many were removed.
    pub fn remove_included(&mut self, txs: &[SignedTransaction]) -> usize {
        let mut removed = 0;
        for tx in txs {
            if self.remove_internal(&tx.hash()).is_ok() {
                removed += 1;
            }
            removed += self.observe_nonce(tx.from, tx.nonce + 1).len();
        }
        removed
    }

    /// Returns transactions from reverted blocks to the pool.
    ///
    /// Unlike `submit`, this does not reject nonces below the sender's last
    /// observed nonce: the chain those nonces were consumed on was just
    /// abandoned. Capacity still applies. Returns how many were accepted.
    pub fn reinsert(&mut self, txs: Vec<SignedTransaction>, now: Timestamp) -> usize {
        let mut accepted = 0;
        for tx in txs {
            let entry = PooledTransaction::new(tx, now);
            if self.by_hash.contains_key(&entry.hash) {
                continue;
            }

            let sender = entry.sender;
            let queue = self.by_sender.get(&sender);
            let state_nonce = queue.map_or(entry.nonce, |q| q.state_nonce.min(entry.nonce));
            let existing = queue.and_then(|q| q.txs.get(&entry.nonce)).copied();

            if let Some(existing) = existing {
                let keep_existing = self
                    .by_hash
                    .get(&existing)
                    .map_or(false, |tx| tx.fee >= entry.fee);
                if keep_existing {
                    continue;
                }
                let _ = self.remove_internal(&existing);
            } else if self.by_hash.len() >= self.config.max_transactions
                && !matches!(self.try_evict_for(&entry), Ok(true))
            {
                continue;
            }

            self.insert(entry, state_nonce);
            if let Some(queue) = self.by_sender.get_mut(&sender) {
                queue.state_nonce = state_nonce;
            }
            accepted += 1;
        }
        accepted
    }

    /// Re-reads every sender's on-chain nonce after the head moved and drops
    /// transactions that became stale. Senders for which `nonce_of` returns
    /// `None` are left untouched.
    pub fn prune_stale<F>(&mut self, mut nonce_of: F) -> Vec<Hash>
    where
        F: FnMut(&Address) -> Option<u64>,
    {
        let senders: Vec<Address> = self.by_sender.keys().copied().collect();
        let mut removed = Vec::new();
        for sender in senders {
            if let Some(nonce) = nonce_of(&sender) {
                removed.extend(self.observe_nonce(sender, nonce));
            }
        }
        if !removed.is_empty() {
            debug!(count = removed.len(), "pruned stale transactions");
        }
        removed
    }

    /// Selects ready transactions for a block of at most `max_bytes`.
    ///
    /// Each sender contributes its ready run in nonce order. Across senders
    /// the highest fee goes first; equal fees are ordered by
    /// `keccak(seed || tx_hash)`, with `seed` the parent block hash, so the
    /// result is reproducible for a given seed. A transaction that does not
    /// fit ends its sender's run. Nothing is removed.
    pub fn drain_for_block(&self, max_bytes: u64, seed: &Hash) -> Vec<SignedTransaction> {
        let candidate = |tx: &PooledTransaction| DrainCandidate {
            fee: tx.fee,
            rank: seeded_rank(seed, &tx.hash),
            hash: tx.hash,
        };

        let mut heap: BinaryHeap<DrainCandidate> = self
            .by_sender
            .values()
            .filter_map(|q| q.txs.get(&q.state_nonce))
            .filter_map(|hash| self.by_hash.get(hash))
            .map(candidate)
            .collect();

        let mut remaining = max_bytes;
        let mut selected = Vec::new();

        while let Some(next) = heap.pop() {
            let Some(tx) = self.by_hash.get(&next.hash) else {
                continue;
            };
            if tx.size > remaining {
                continue;
            }
            remaining -= tx.size;
            selected.push(tx.transaction.clone());

            let follower = self
                .by_sender
                .get(&tx.sender)
                .and_then(|q| q.txs.get(&(tx.nonce + 1)))
                .and_then(|hash| self.by_hash.get(hash));
            if let Some(follower) = follower {
                heap.push(candidate(follower));
            }
        }

        selected
    }

    /// Gets the number of transactions for a sender.
    pub fn sender_count(&self, sender: &Address) -> usize {
        self.by_sender.get(sender).map_or(0, |q| q.txs.len())
    }

    pub fn status(&self) -> PoolStatus {
        let ready: usize = self.by_sender.values().map(SenderQueue::ready_len).sum();
        PoolStatus {
            total: self.by_hash.len(),
            ready,
            queued: self.by_hash.len() - ready,
            senders: self.by_sender.len(),
            total_bytes: self.total_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn create_tx(sender_byte: u8, nonce: u64, fee: u64) -> SignedTransaction {
        SignedTransaction {
            from: [sender_byte; 20],
            to: [0xEE; 20],
            value: U256::from(1),
            nonce,
            fee: U256::from(fee),
            data: vec![],
            signature: [0u8; 65],
            cosignatures: vec![],
        }
    }

    fn pool() -> TransactionPool {
        TransactionPool::new(PoolConfig::for_testing())
    }

    // =========================================================================
    // ADMISSION TESTS
    // =========================================================================

    #[test]
    fn test_duplicate_rejected() {
        let mut pool = pool();
        let tx = create_tx(0xAA, 0, 10);
        pool.submit(tx.clone(), 0, 1).unwrap();
        assert_eq!(
            pool.submit(tx.clone(), 0, 2),
            Err(PoolError::DuplicateTransaction(tx.hash()))
        );
    }

    #[test]
    fn test_stale_nonce_rejected() {
        let mut pool = pool();
        assert_eq!(
            pool.submit(create_tx(0xAA, 2, 10), 3, 1),
            Err(PoolError::StaleNonce { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn test_outdated_state_nonce_cannot_readmit_included_tx() {
        let mut pool = pool();
        let t0 = create_tx(0xAA, 0, 10);
        let t1 = create_tx(0xAA, 1, 10);
        pool.submit(t0.clone(), 0, 1).unwrap();
        pool.submit(t1.clone(), 0, 1).unwrap();
        pool.remove_included(&[t0.clone()]);
        assert_eq!(pool.next_nonce(&[0xAA; 20]), Some(2));

        // Nonce read before the block above was committed.
        assert_eq!(
            pool.submit(t0, 0, 2),
            Err(PoolError::StaleNonce { expected: 1, actual: 0 })
        );
        assert_eq!(pool.drain_for_block(u64::MAX, &[0; 32]), vec![t1]);
        assert_eq!(pool.next_nonce(&[0xAA; 20]), Some(2));
    }

    #[test]
    fn test_future_nonce_is_queued_until_gap_fills() {
        let mut pool = pool();
        assert_eq!(pool.submit(create_tx(0xAA, 2, 10), 0, 1), Ok(Placement::Queued));
        assert_eq!(pool.submit(create_tx(0xAA, 0, 10), 0, 1), Ok(Placement::Ready));
        assert_eq!(pool.status().ready, 1);
        assert_eq!(pool.drain_for_block(u64::MAX, &[0; 32]).len(), 1);

        assert_eq!(pool.submit(create_tx(0xAA, 1, 10), 0, 1), Ok(Placement::Ready));
        assert_eq!(pool.status().ready, 3);
        assert_eq!(pool.next_nonce(&[0xAA; 20]), Some(3));

        let nonces: Vec<u64> = pool
            .drain_for_block(u64::MAX, &[0; 32])
            .iter()
            .map(|t| t.nonce)
            .collect();
        assert_eq!(nonces, vec![0, 1, 2]);
    }

    #[test]
    fn test_nonce_gap_limit() {
        let mut pool = pool();
        let max_gap = pool.config().max_nonce_gap;
        assert!(matches!(
            pool.submit(create_tx(0xAA, max_gap + 1, 10), 0, 1),
            Err(PoolError::NonceTooFarAhead { .. })
        ));
    }

    #[test]
    fn test_replace_by_fee() {
        let mut pool = pool();
        let original = create_tx(0xAA, 0, 100);
        pool.submit(original.clone(), 0, 1).unwrap();

        assert!(matches!(
            pool.submit(create_tx(0xAA, 0, 105), 0, 2),
            Err(PoolError::InsufficientFeeBump { .. })
        ));

        let bumped = create_tx(0xAA, 0, 110);
        pool.submit(bumped.clone(), 0, 3).unwrap();
        assert!(!pool.contains(&original.hash()));
        assert!(pool.contains(&bumped.hash()));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_full_pool_evicts_lowest_fee() {
        let mut pool = TransactionPool::new(PoolConfig {
            max_transactions: 3,
            ..PoolConfig::for_testing()
        });
        let cheap = create_tx(0x01, 0, 1);
        pool.submit(cheap.clone(), 0, 1).unwrap();
        pool.submit(create_tx(0x02, 0, 5), 0, 1).unwrap();
        pool.submit(create_tx(0x03, 0, 5), 0, 1).unwrap();

        // Equal to the lowest fee does not evict.
        assert_eq!(
            pool.submit(create_tx(0x04, 0, 1), 0, 2),
            Err(PoolError::PoolFull { capacity: 3 })
        );

        pool.submit(create_tx(0x05, 0, 2), 0, 2).unwrap();
        assert!(!pool.contains(&cheap.hash()));
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_eviction_keeps_ready_runs_intact() {
        let mut pool = TransactionPool::new(PoolConfig {
            max_transactions: 3,
            ..PoolConfig::for_testing()
        });
        let a0 = create_tx(0xAA, 0, 1);
        let a1 = create_tx(0xAA, 1, 5);
        let queued = create_tx(0xBB, 4, 2);
        pool.submit(a0.clone(), 0, 1).unwrap();
        pool.submit(a1.clone(), 0, 1).unwrap();
        pool.submit(queued.clone(), 0, 1).unwrap();

        // a0 is the cheapest but evicting it would strand a1.
        pool.submit(create_tx(0xCC, 0, 3), 0, 2).unwrap();
        assert!(pool.contains(&a0.hash()));
        assert!(pool.contains(&a1.hash()));
        assert!(!pool.contains(&queued.hash()));
    }

    #[test]
    fn test_eligible_evicted_before_queued() {
        let mut pool = TransactionPool::new(PoolConfig {
            max_transactions: 2,
            ..PoolConfig::for_testing()
        });
        let ready = create_tx(0xAA, 0, 2);
        let queued = create_tx(0xBB, 3, 1);
        pool.submit(ready.clone(), 0, 1).unwrap();
        pool.submit(queued.clone(), 0, 1).unwrap();

        pool.submit(create_tx(0xCC, 0, 3), 0, 2).unwrap();
        assert!(!pool.contains(&ready.hash()));
        assert!(pool.contains(&queued.hash()));

        // Nothing eligible is cheaper than 2 now, so the queued one goes.
        pool.submit(create_tx(0xDD, 0, 2), 0, 3).unwrap();
        assert!(!pool.contains(&queued.hash()));
    }

    #[test]
    fn test_sender_limit() {
        let mut pool = TransactionPool::new(PoolConfig {
            max_per_sender: 2,
            ..PoolConfig::for_testing()
        });
        pool.submit(create_tx(0xAA, 0, 1), 0, 1).unwrap();
        pool.submit(create_tx(0xAA, 1, 1), 0, 1).unwrap();
        assert!(matches!(
            pool.submit(create_tx(0xAA, 2, 1), 0, 1),
            Err(PoolError::SenderLimitReached { limit: 2, .. })
        ));
    }

    // =========================================================================
    // SELECTION TESTS
    // =========================================================================

    #[test]
    fn test_higher_fee_first() {
        let mut pool = pool();
        pool.submit(create_tx(0xAA, 0, 1), 0, 1).unwrap();
        pool.submit(create_tx(0xBB, 0, 9), 0, 1).unwrap();

        let drained = pool.drain_for_block(u64::MAX, &[0; 32]);
        assert_eq!(drained[0].from, [0xBB; 20]);
        // Selection does not remove.
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_drain_respects_size_limit() {
        let mut pool = pool();
        let tx = create_tx(0xAA, 0, 1);
        let size = tx.size_bytes();
        pool.submit(tx, 0, 1).unwrap();
        pool.submit(create_tx(0xAA, 1, 1), 0, 1).unwrap();
        pool.submit(create_tx(0xBB, 0, 1), 0, 1).unwrap();

        assert_eq!(pool.drain_for_block(size * 2, &[0; 32]).len(), 2);
        assert!(pool.drain_for_block(size - 1, &[0; 32]).is_empty());
    }

    #[test]
    fn test_equal_fee_order_depends_on_seed() {
        let mut pool = TransactionPool::with_defaults();
        for sender in 1..=8u8 {
            pool.submit(create_tx(sender, 0, 7), 0, 1).unwrap();
        }
        let order = |seed: Hash| -> Vec<Address> {
            pool.drain_for_block(u64::MAX, &seed)
                .iter()
                .map(|t| t.from)
                .collect()
        };
        assert_eq!(order([1; 32]), order([1; 32]));
        assert_ne!(order([1; 32]), order([2; 32]));
    }

    // =========================================================================
    // HEAD CHANGE TESTS
    // =========================================================================

    #[test]
    fn test_remove_included_drops_conflicts() {
        let mut pool = pool();
        let a0 = create_tx(0xAA, 0, 1);
        let a1 = create_tx(0xAA, 1, 1);
        pool.submit(a0.clone(), 0, 1).unwrap();
        pool.submit(a1.clone(), 0, 1).unwrap();

        // A competing nonce-0 transaction from the same sender was included.
        let mut other = create_tx(0xAA, 0, 50);
        other.data = vec![1];
        assert_eq!(pool.remove_included(&[other]), 1);
        assert!(!pool.contains(&a0.hash()));
        assert_eq!(pool.drain_for_block(u64::MAX, &[0; 32]), vec![a1]);
    }

    #[test]
    fn test_reinsert_and_prune() {
        let mut pool = pool();
        let t0 = create_tx(0xAA, 0, 1);
        let t1 = create_tx(0xAA, 1, 1);
        pool.submit(create_tx(0xAA, 2, 1), 2, 1).unwrap();

        // A reorg returned nonces 0 and 1.
        assert_eq!(pool.reinsert(vec![t0.clone(), t1.clone()], 5), 2);
        assert_eq!(pool.status().ready, 3);

        // The new head already contains nonce 0.
        let removed = pool.prune_stale(|_| Some(1));
        assert_eq!(removed, vec![t0.hash()]);
        assert_eq!(pool.drain_for_block(u64::MAX, &[0; 32])[0], t1);
    }

    #[test]
    fn test_status_counts() {
        let mut pool = pool();
        pool.submit(create_tx(0xAA, 0, 1), 0, 1).unwrap();
        pool.submit(create_tx(0xAA, 3, 1), 0, 1).unwrap();
        pool.submit(create_tx(0xBB, 0, 1), 0, 1).unwrap();
        let status = pool.status();
        assert_eq!(status.total, 3);
        assert_eq!(status.ready, 2);
        assert_eq!(status.queued, 1);
        assert_eq!(status.senders, 2);
    }

    proptest! {
        #[test]
        fn prop_drain_is_independent_of_arrival_order(
            fees in proptest::collection::vec(1u64..4, 2..10),
            seed in any::<[u8; 32]>(),
        ) {
            let txs: Vec<_> = fees
                .iter()
                .enumerate()
                .map(|(i, fee)| create_tx(i as u8 + 1, 0, *fee))
                .collect();

            let mut forward = TransactionPool::with_defaults();
            for tx in &txs {
                forward.submit(tx.clone(), 0, 1).unwrap();
            }
            let mut backward = TransactionPool::with_defaults();
            for tx in txs.iter().rev() {
                backward.submit(tx.clone(), 0, 1).unwrap();
            }

            prop_assert_eq!(
                forward.drain_for_block(u64::MAX, &seed),
                backward.drain_for_block(u64::MAX, &seed)
            );
        }
    }
}
