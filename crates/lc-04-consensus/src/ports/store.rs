//! Block store port.
//!
//! Bodies and receipts are kept for every validated block, canonical or not,
//! so a reorg can switch branches without refetching. The canonical height
//! index and finality statuses are maintained by the writer.

use crate::domain::StoreError;
use lc_01_state_trie::TrieChange;
use shared_types::{Block, FinalityStatus, Hash, Receipt};

pub trait BlockStore: Send + Sync {
    /// Stores a validated block with its receipts and undo journal.
    fn put_block(
        &self,
        block: &Block,
        receipts: &[Receipt],
        undo: &[TrieChange],
    ) -> Result<(), StoreError>;

    fn block(&self, hash: &Hash) -> Result<Option<Block>, StoreError>;

    fn contains(&self, hash: &Hash) -> Result<bool, StoreError> {
        Ok(self.block(hash)?.is_some())
    }

    /// Receipts of a stored block, in transaction order.
    fn receipts(&self, block_hash: &Hash) -> Result<Vec<Receipt>, StoreError>;

    /// Changes that take the parent's state root to this block's.
    fn undo(&self, block_hash: &Hash) -> Result<Vec<TrieChange>, StoreError>;

    /// Every stored block that includes `tx_hash`, canonical or not.
    fn blocks_containing(&self, tx_hash: &Hash) -> Result<Vec<Hash>, StoreError>;

    fn canonical_hash(&self, height: u64) -> Result<Option<Hash>, StoreError>;

    /// Replaces the canonical index from `from_height` upward with `hashes`.
    fn set_canonical(&self, from_height: u64, hashes: &[Hash]) -> Result<(), StoreError>;

    fn finality(&self, hash: &Hash) -> Result<Option<FinalityStatus>, StoreError>;

    fn set_finality(&self, hash: &Hash, status: FinalityStatus) -> Result<(), StoreError>;
}
