//! Block tree and canonical chain tracking.
//!
//! Every validated block is kept in the tree, whether or not it is on the
//! canonical chain. The canonical chain is the path from genesis to the tip,
//! indexed by height. Score is chain length, so a competing branch must be
//! strictly longer to win; on a tie the first-seen tip stays.

use super::errors::{ConsensusError, ConsensusResult};
use shared_types::{Block, Hash};
use std::collections::HashMap;

/// Metadata of a validated block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainEntry {
    pub hash: Hash,
    pub parent_hash: Hash,
    pub height: u64,
    pub timestamp: u64,
    pub state_root: Hash,
    /// Serialized block size, for the dynamic size limit.
    pub size: u64,
}

impl ChainEntry {
    pub fn from_block(block: &Block) -> Self {
        Self {
            hash: block.hash(),
            parent_hash: block.parent_hash(),
            height: block.height(),
            timestamp: block.header.timestamp,
            state_root: block.header.state_root,
            size: block.size_bytes(),
        }
    }

    /// Fork-choice weight: number of blocks from genesis to here inclusive.
    pub fn score(&self) -> u64 {
        self.height + 1
    }
}

/// Chain state tracking known blocks
pub struct ChainIndex {
    entries: HashMap<Hash, ChainEntry>,
    children: HashMap<Hash, Vec<Hash>>,
    /// Canonical block hash at each height; `canonical[0]` is genesis.
    canonical: Vec<Hash>,
}

impl ChainIndex {
    /// Create chain state with genesis block
    pub fn with_genesis(genesis: &Block) -> ConsensusResult<Self> {
        if !genesis.header.is_genesis() {
            return Err(ConsensusError::InvalidGenesis(format!(
                "height {} with parent {}",
                genesis.height(),
                hex::encode(genesis.parent_hash())
            )));
        }
        let entry = ChainEntry::from_block(genesis);
        let hash = entry.hash;
        Ok(Self {
            entries: HashMap::from([(hash, entry)]),
            children: HashMap::new(),
            canonical: vec![hash],
        })
    }

    /// Adds a validated block to the tree. Does not move the tip.
    pub fn insert(&mut self, entry: ChainEntry) -> ConsensusResult<()> {
        if self.entries.contains_key(&entry.hash) {
            return Err(ConsensusError::AlreadyKnown(entry.hash));
        }
        if !self.entries.contains_key(&entry.parent_hash) {
            return Err(ConsensusError::UnknownParent(entry.parent_hash));
        }
        self.children
            .entry(entry.parent_hash)
            .or_default()
            .push(entry.hash);
        self.entries.insert(entry.hash, entry);
        Ok(())
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn get(&self, hash: &Hash) -> Option<&ChainEntry> {
        self.entries.get(hash)
    }

    pub fn children(&self, hash: &Hash) -> &[Hash] {
        self.children.get(hash).map_or(&[], Vec::as_slice)
    }

    pub fn genesis_hash(&self) -> Hash {
        self.canonical[0]
    }

    /// Current canonical tip.
    pub fn tip(&self) -> &ChainEntry {
        let hash = self.canonical[self.canonical.len() - 1];
        &self.entries[&hash]
    }

    pub fn height(&self) -> u64 {
        (self.canonical.len() - 1) as u64
    }

    pub fn canonical_hash(&self, height: u64) -> Option<Hash> {
        usize::try_from(height)
            .ok()
            .and_then(|h| self.canonical.get(h))
            .copied()
    }

    pub fn is_canonical(&self, hash: &Hash) -> bool {
        self.entries
            .get(hash)
            .is_some_and(|e| self.canonical_hash(e.height) == Some(*hash))
    }

    /// Whether `candidate` would replace the current tip.
    pub fn is_better_than_tip(&self, candidate: &Hash) -> bool {
        self.entries
            .get(candidate)
            .is_some_and(|e| e.score() > self.tip().score())
    }

    /// The ancestor of `hash` at `height` (or `hash` itself).
    pub fn ancestor_at(&self, hash: &Hash, height: u64) -> Option<Hash> {
        let mut current = self.entries.get(hash)?;
        if height > current.height {
            return None;
        }
        if self.is_canonical(hash) {
            return self.canonical_hash(height);
        }
        while current.height > height {
            // Rejoin the canonical index as soon as possible.
            if self.is_canonical(&current.hash) {
                return self.canonical_hash(height);
            }
            current = self.entries.get(&current.parent_hash)?;
        }
        Some(current.hash)
    }

    /// True if `ancestor` is `descendant` or lies on its path to genesis.
    pub fn is_ancestor(&self, ancestor: &Hash, descendant: &Hash) -> bool {
        match self.entries.get(ancestor) {
            Some(entry) => self.ancestor_at(descendant, entry.height) == Some(*ancestor),
            None => false,
        }
    }

    /// Lowest common ancestor of two known blocks.
    pub fn common_ancestor(&self, a: &Hash, b: &Hash) -> Option<Hash> {
        let mut a = self.entries.get(a)?;
        let mut b = self.entries.get(b)?;
        while a.height > b.height {
            a = self.entries.get(&a.parent_hash)?;
        }
        while b.height > a.height {
            b = self.entries.get(&b.parent_hash)?;
        }
        while a.hash != b.hash {
            a = self.entries.get(&a.parent_hash)?;
            b = self.entries.get(&b.parent_hash)?;
        }
        Some(a.hash)
    }

    /// Blocks after `ancestor` up to and including `tip`, oldest first.
    pub fn branch(&self, ancestor: &Hash, tip: &Hash) -> Option<Vec<Hash>> {
        let stop = self.entries.get(ancestor)?.height;
        let mut path = Vec::new();
        let mut current = self.entries.get(tip)?;
        while current.height > stop {
            path.push(current.hash);
            current = self.entries.get(&current.parent_hash)?;
        }
        if current.hash != *ancestor {
            return None;
        }
        path.reverse();
        Some(path)
    }

    /// Sizes of the ancestors of `parent` (inclusive) at the given heights.
    pub fn size_on_branch(&self, parent: &Hash, height: u64) -> Option<u64> {
        let hash = self.ancestor_at(parent, height)?;
        self.entries.get(&hash).map(|e| e.size)
    }

    /// Makes `tip` the canonical tip, rewriting the height index from the
    /// point where its branch leaves the current canonical chain.
    pub fn set_canonical_tip(&mut self, tip: &Hash) -> ConsensusResult<()> {
        let mut path = Vec::new();
        let mut current = self
            .entries
            .get(tip)
            .ok_or(ConsensusError::UnknownParent(*tip))?;
        while !self.is_canonical(&current.hash) {
            path.push(current.hash);
            current = self
                .entries
                .get(&current.parent_hash)
                .ok_or(ConsensusError::UnknownParent(current.parent_hash))?;
        }
        let fork_height = current.height as usize;
        self.canonical.truncate(fork_height + 1);
        self.canonical.extend(path.into_iter().rev());
        Ok(())
    }

    /// Leaves of the block tree.
    pub fn tips(&self) -> Vec<Hash> {
        self.entries
            .keys()
            .filter(|hash| self.children(hash).is_empty())
            .copied()
            .collect()
    }

    /// Get count of known blocks
    pub fn block_count(&self) -> usize {
        self.entries.len()
    }
}
