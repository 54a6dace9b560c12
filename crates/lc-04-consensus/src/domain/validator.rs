//! # Block Validator
//!
//! Runs a candidate through the validation stages:
//!
//! 1. **Structure**: parent known, height is parent + 1, timestamp not
//!    before the parent, transactions root matches, size within the dynamic
//!    limit.
//! 2. **Transactions**: signatures pre-checked in parallel, then every
//!    transaction applied in order on top of the parent's state root.
//! 3. **Reward**: `base_reward + fees` credited to the producer; the result
//!    must equal the declared state root.
//!
//! Nothing is written to the chain here; the caller commits the returned
//! [`ValidatedBlock`]. A block rejected for its own content is remembered by
//! hash and not re-evaluated while it stays in the bounded rejection cache.

use super::block_size::BlockSizePolicy;
use super::chain::{ChainEntry, ChainIndex};
use super::config::ConsensusConfig;
use super::errors::{ConsensusError, ConsensusResult};
use super::reward::{collected_fees, credit_reward};
use super::stage::{BlockCandidate, ValidationStage};
use crate::metrics;
use lc_01_state_trie::{StateDb, TrieChange};
use lc_02_execution::{apply, first_bad_signature, ExecutionContext, TransactionExecutor, TxRejection};
use lru::LruCache;
use shared_types::{transactions_root, Block, BlockHeader, ErrorClass, ErrorKind, Hash, Receipt};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// A block that passed every stage, with everything needed to commit it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedBlock {
    pub block: Block,
    pub hash: Hash,
    pub receipts: Vec<Receipt>,
    /// Account-trie changes from the parent's state root to this block's.
    /// Reverting them restores the parent root exactly.
    pub undo: Vec<TrieChange>,
}

impl ValidatedBlock {
    pub fn entry(&self) -> ChainEntry {
        ChainEntry::from_block(&self.block)
    }
}

pub struct BlockValidator {
    state: StateDb,
    executor: Arc<dyn TransactionExecutor>,
    config: ConsensusConfig,
    size_policy: BlockSizePolicy,
    rejected: LruCache<Hash, ()>,
}

impl BlockValidator {
    pub fn new(
        state: StateDb,
        executor: Arc<dyn TransactionExecutor>,
        config: ConsensusConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.rejected_cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            rejected: LruCache::new(capacity),
            size_policy: BlockSizePolicy::new(config.block_size.clone()),
            state,
            executor,
            config,
        }
    }

    pub fn state(&self) -> &StateDb {
        &self.state
    }

    pub fn executor(&self) -> &dyn TransactionExecutor {
        self.executor.as_ref()
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn is_rejected(&self, hash: &Hash) -> bool {
        self.rejected.contains(hash)
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Size limit for a child of `parent`.
    pub fn max_block_size(&self, chain: &ChainIndex, parent: &Hash) -> ConsensusResult<u64> {
        let height = chain
            .get(parent)
            .ok_or(ConsensusError::UnknownParent(*parent))?
            .height
            + 1;
        self.size_policy
            .limit_for(height, |h| chain.size_on_branch(parent, h))
            .ok_or(ConsensusError::UnknownParent(*parent))
    }

    /// Validates `block` as a child of a block already in `chain`.
    pub fn validate(&mut self, block: Block, chain: &ChainIndex) -> ConsensusResult<ValidatedBlock> {
        let hash = block.hash();
        if self.rejected.get(&hash).is_some() {
            return Err(ConsensusError::AlreadyRejected(hash));
        }
        if chain.contains(&hash) {
            return Err(ConsensusError::AlreadyKnown(hash));
        }

        let started = Instant::now();
        let mut candidate = BlockCandidate::new(block);

        match self.run_stages(&mut candidate, chain) {
            Ok((receipts, undo)) => {
                metrics::record_block_validated();
                metrics::record_validation_latency(started.elapsed().as_secs_f64());
                debug!(
                    block = %hex::encode(hash),
                    height = candidate.block.height(),
                    txs = candidate.block.transactions.len(),
                    "block validated"
                );
                Ok(ValidatedBlock {
                    block: candidate.block,
                    hash,
                    receipts,
                    undo,
                })
            }
            Err(e) => {
                candidate.reject();
                if e.is_permanent() {
                    self.rejected.put(hash, ());
                }
                metrics::record_block_rejected(e.reason());
                if e.kind() == ErrorKind::InvariantViolation {
                    error!(block = %hex::encode(hash), error = %e, "block rejected");
                } else {
                    warn!(block = %hex::encode(hash), error = %e, "block rejected");
                }
                Err(e)
            }
        }
    }

    /// Re-executes an already validated block on top of `parent_root`,
    /// for reorgs. The result must reproduce the declared state root.
    pub fn replay(&self, block: &Block, parent_root: &Hash) -> ConsensusResult<Vec<Receipt>> {
        let (root, mut receipts) = self.execute_transactions(parent_root, block)?;
        self.settle(&block.header, &root, &receipts)?;
        let hash = block.hash();
        for receipt in &mut receipts {
            receipt.block_hash = hash;
        }
        Ok(receipts)
    }

    fn run_stages(
        &self,
        candidate: &mut BlockCandidate,
        chain: &ChainIndex,
    ) -> ConsensusResult<(Vec<Receipt>, Vec<TrieChange>)> {
        let parent = chain
            .get(&candidate.block.parent_hash())
            .ok_or(ConsensusError::UnknownParent(candidate.block.parent_hash()))?
            .clone();

        self.check_structure(&candidate.block, &parent, chain)?;
        candidate.advance(ValidationStage::StructurallyValid)?;

        if let Some(index) = first_bad_signature(&candidate.block.transactions) {
            return Err(ConsensusError::InvalidTransaction {
                index,
                reason: TxRejection::BadSignature,
            });
        }
        let (root, mut receipts) =
            self.execute_transactions(&parent.state_root, &candidate.block)?;
        candidate.advance(ValidationStage::TransactionsValid)?;

        let root = self.settle(&candidate.block.header, &root, &receipts)?;
        candidate.advance(ValidationStage::Applied)?;

        let undo = self.state.trie().diff(&parent.state_root, &root)?;
        for receipt in &mut receipts {
            receipt.block_hash = candidate.hash;
        }
        Ok((receipts, undo))
    }

    /// Credits the reward on top of the post-transaction root and checks the
    /// result against the header.
    fn settle(&self, header: &BlockHeader, root: &Hash, receipts: &[Receipt]) -> ConsensusResult<Hash> {
        let root = credit_reward(
            &self.state,
            root,
            &header.producer,
            self.config.base_reward,
            collected_fees(receipts),
        )?;
        if root != header.state_root {
            return Err(ConsensusError::StateRootMismatch {
                declared: header.state_root,
                computed: root,
            });
        }
        Ok(root)
    }

    fn check_structure(
        &self,
        block: &Block,
        parent: &ChainEntry,
        chain: &ChainIndex,
    ) -> ConsensusResult<()> {
        let header = &block.header;
        if header.height != parent.height + 1 {
            return Err(ConsensusError::InvalidHeight {
                expected: parent.height + 1,
                actual: header.height,
            });
        }
        if header.timestamp < parent.timestamp {
            return Err(ConsensusError::InvalidTimestamp {
                block: header.timestamp,
                parent: parent.timestamp,
            });
        }

        let computed = transactions_root(&block.transactions);
        if computed != header.transactions_root {
            return Err(ConsensusError::TransactionsRootMismatch {
                declared: header.transactions_root,
                computed,
            });
        }

        let limit = self.max_block_size(chain, &parent.hash)?;
        let size = block.size_bytes();
        if size > limit {
            return Err(ConsensusError::BlockTooLarge { size, limit });
        }
        Ok(())
    }

    /// Applies the block's transactions in order. Any rejection invalidates
    /// the whole block.
    fn execute_transactions(
        &self,
        parent_root: &Hash,
        block: &Block,
    ) -> ConsensusResult<(Hash, Vec<Receipt>)> {
        let mut root = *parent_root;
        let mut receipts = Vec::with_capacity(block.transactions.len());
        for (index, tx) in block.transactions.iter().enumerate() {
            let ctx = execution_context(&block.header, index);
            let applied = apply(&self.state, &root, tx, &ctx, self.executor.as_ref())
                .map_err(|reason| ConsensusError::InvalidTransaction { index, reason })?;
            root = applied.state_root;
            receipts.push(applied.receipt);
        }
        Ok((root, receipts))
    }
}

pub(crate) fn execution_context(header: &BlockHeader, index: usize) -> ExecutionContext {
    ExecutionContext {
        block_height: header.height,
        block_timestamp: header.timestamp,
        producer: header.producer,
        tx_index: index as u32,
    }
}
