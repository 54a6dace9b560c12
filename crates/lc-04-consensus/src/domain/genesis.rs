//! Genesis block construction from initial allocations.

use super::errors::ConsensusResult;
use lc_01_state_trie::StateDb;
use shared_types::{
    transactions_root, Account, Block, BlockHeader, EMPTY_TRIE_ROOT, ZERO_HASH,
};

/// Writes `allocations` into an empty state and returns the genesis block
/// committing to it.
pub fn build_genesis(
    state: &StateDb,
    allocations: &[Account],
    timestamp: u64,
) -> ConsensusResult<Block> {
    let state_root = state.put_accounts(&EMPTY_TRIE_ROOT, allocations)?;
    Ok(Block {
        header: BlockHeader {
            height: 0,
            parent_hash: ZERO_HASH,
            timestamp,
            producer: [0u8; 20],
            transactions_root: transactions_root(&[]),
            state_root,
        },
        transactions: vec![],
    })
}
