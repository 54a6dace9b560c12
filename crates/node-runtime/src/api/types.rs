//! Views returned by the ledger API.

use lc_03_tx_pool::Placement;
use shared_types::{Address, BlockHeader, FinalityStatus, Hash, SignedTransaction, U256};

/// Result of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub hash: Hash,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountView {
    pub address: Address,
    pub balance: U256,
    pub nonce: u64,
    /// Set for contracts only.
    pub code_hash: Option<Hash>,
}

/// Transactions of a block, in full or by hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockTransactions {
    Hashes(Vec<Hash>),
    Full(Vec<SignedTransaction>),
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        match self {
            BlockTransactions::Hashes(hashes) => hashes.len(),
            BlockTransactions::Full(txs) => txs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockView {
    pub hash: Hash,
    pub header: BlockHeader,
    pub size: u64,
    pub total_fees: U256,
    pub canonical: bool,
    pub finality: FinalityStatus,
    pub transactions: BlockTransactions,
}

/// The last fully committed canonical block. Readers only ever see these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedHead {
    pub hash: Hash,
    pub height: u64,
    pub timestamp: u64,
    pub state_root: Hash,
}

/// How an imported block affected the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The block extended the canonical tip.
    Extended { hash: Hash, height: u64 },
    /// The block's branch replaced the canonical chain.
    Reorganized {
        hash: Hash,
        common_ancestor: Hash,
        depth: usize,
    },
    /// Valid, stored, but not (yet) better than the canonical tip.
    SideBranch { hash: Hash },
}

impl ImportOutcome {
    pub fn hash(&self) -> Hash {
        match self {
            ImportOutcome::Extended { hash, .. }
            | ImportOutcome::Reorganized { hash, .. }
            | ImportOutcome::SideBranch { hash } => *hash,
        }
    }
}
