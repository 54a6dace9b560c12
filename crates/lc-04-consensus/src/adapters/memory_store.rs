//! In-memory block store.

use crate::domain::StoreError;
use crate::ports::BlockStore;
use lc_01_state_trie::TrieChange;
use parking_lot::RwLock;
use shared_types::{Block, FinalityStatus, Hash, Receipt};
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct Inner {
    blocks: HashMap<Hash, Block>,
    receipts: HashMap<Hash, Vec<Receipt>>,
    undo: HashMap<Hash, Vec<TrieChange>>,
    tx_index: HashMap<Hash, Vec<Hash>>,
    canonical: BTreeMap<u64, Hash>,
    finality: HashMap<Hash, FinalityStatus>,
}

/// [`BlockStore`] backed by hash maps.
#[derive(Default)]
pub struct InMemoryBlockStore {
    inner: RwLock<Inner>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_count(&self) -> usize {
        self.inner.read().blocks.len()
    }
}

impl BlockStore for InMemoryBlockStore {
    fn put_block(
        &self,
        block: &Block,
        receipts: &[Receipt],
        undo: &[TrieChange],
    ) -> Result<(), StoreError> {
        let hash = block.hash();
        let mut inner = self.inner.write();
        if inner.blocks.contains_key(&hash) {
            return Ok(());
        }
        for tx in &block.transactions {
            inner.tx_index.entry(tx.hash()).or_default().push(hash);
        }
        inner.receipts.insert(hash, receipts.to_vec());
        inner.undo.insert(hash, undo.to_vec());
        inner.blocks.insert(hash, block.clone());
        Ok(())
    }

    fn block(&self, hash: &Hash) -> Result<Option<Block>, StoreError> {
        Ok(self.inner.read().blocks.get(hash).cloned())
    }

    fn receipts(&self, block_hash: &Hash) -> Result<Vec<Receipt>, StoreError> {
        self.inner
            .read()
            .receipts
            .get(block_hash)
            .cloned()
            .ok_or(StoreError::BlockNotFound(*block_hash))
    }

    fn undo(&self, block_hash: &Hash) -> Result<Vec<TrieChange>, StoreError> {
        self.inner
            .read()
            .undo
            .get(block_hash)
            .cloned()
            .ok_or(StoreError::MissingUndo(*block_hash))
    }

    fn blocks_containing(&self, tx_hash: &Hash) -> Result<Vec<Hash>, StoreError> {
        Ok(self
            .inner
            .read()
            .tx_index
            .get(tx_hash)
            .cloned()
            .unwrap_or_default())
    }

    fn canonical_hash(&self, height: u64) -> Result<Option<Hash>, StoreError> {
        Ok(self.inner.read().canonical.get(&height).copied())
    }

    fn set_canonical(&self, from_height: u64, hashes: &[Hash]) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        inner.canonical.retain(|height, _| *height < from_height);
        for (offset, hash) in hashes.iter().enumerate() {
            inner.canonical.insert(from_height + offset as u64, *hash);
        }
        Ok(())
    }

    fn finality(&self, hash: &Hash) -> Result<Option<FinalityStatus>, StoreError> {
        Ok(self.inner.read().finality.get(hash).copied())
    }

    fn set_finality(&self, hash: &Hash, status: FinalityStatus) -> Result<(), StoreError> {
        self.inner.write().finality.insert(*hash, status);
        Ok(())
    }
}
