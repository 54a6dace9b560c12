//! Block assembly for the local producer.

use super::chain::ChainIndex;
use super::errors::{ConsensusError, ConsensusResult};
use super::reward::{collected_fees, credit_reward};
use super::validator::{execution_context, BlockValidator};
use crate::metrics;
use lc_02_execution::{apply, TxRejection};
use shared_types::{transactions_root, Address, Block, BlockHeader, Hash, Receipt, SignedTransaction};
use tracing::{debug, info};

/// An assembled block and what happened to each candidate.
#[derive(Debug)]
pub struct BuiltBlock {
    pub block: Block,
    pub receipts: Vec<Receipt>,
    /// Candidates that failed against the block's state, with the reason.
    pub rejected: Vec<(Hash, TxRejection)>,
}

pub struct BlockBuilder<'a> {
    validator: &'a BlockValidator,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(validator: &'a BlockValidator) -> Self {
        Self { validator }
    }

    /// Assembles a child of `parent` from `candidates`, in the given order.
    ///
    /// Candidates that fail to apply or would push the block over its size
    /// limit are left out; the rest are applied in order, the reward is
    /// credited and the header commits to the resulting roots. A timestamp
    /// earlier than the parent's is raised to the parent's.
    pub fn build(
        &self,
        chain: &ChainIndex,
        parent: &Hash,
        producer: Address,
        timestamp: u64,
        candidates: Vec<SignedTransaction>,
    ) -> ConsensusResult<BuiltBlock> {
        let parent_entry = chain
            .get(parent)
            .ok_or(ConsensusError::UnknownParent(*parent))?;
        let limit = self.validator.max_block_size(chain, parent)?;
        let state = self.validator.state();

        let mut header = BlockHeader {
            height: parent_entry.height + 1,
            parent_hash: *parent,
            timestamp: timestamp.max(parent_entry.timestamp),
            producer,
            transactions_root: [0u8; 32],
            state_root: [0u8; 32],
        };
        let mut block = Block {
            header: header.clone(),
            transactions: Vec::new(),
        };

        let mut size = block.size_bytes();
        let mut root = parent_entry.state_root;
        let mut receipts = Vec::new();
        let mut rejected = Vec::new();

        for tx in candidates {
            let tx_size = tx.size_bytes();
            if size + tx_size > limit {
                continue;
            }
            let ctx = execution_context(&header, block.transactions.len());
            match apply(state, &root, &tx, &ctx, self.validator.executor()) {
                Ok(applied) => {
                    root = applied.state_root;
                    receipts.push(applied.receipt);
                    block.transactions.push(tx);
                    size += tx_size;
                }
                Err(TxRejection::State(e)) => return Err(e.into()),
                Err(reason) => {
                    debug!(tx = %hex::encode(tx.hash()), %reason, "left out of block");
                    rejected.push((tx.hash(), reason));
                }
            }
        }

        header.transactions_root = transactions_root(&block.transactions);
        header.state_root = credit_reward(
            state,
            &root,
            &producer,
            self.validator.config().base_reward,
            collected_fees(&receipts),
        )?;
        block.header = header;

        let hash = block.hash();
        for receipt in &mut receipts {
            receipt.block_hash = hash;
        }

        metrics::record_block_built(block.transactions.len());
        info!(
            block = %hex::encode(hash),
            height = block.height(),
            txs = block.transactions.len(),
            size,
            "built block"
        );
        Ok(BuiltBlock {
            block,
            receipts,
            rejected,
        })
    }
}
