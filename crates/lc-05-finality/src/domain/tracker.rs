//! # Finality Tracker
//!
//! A canonical block becomes final once the canonical tip is
//! `confirmation_threshold` blocks above it. Finality only moves forward:
//! the last finalized block is a barrier no reorg may cross.
//!
//! A block off the canonical chain stays `Pending` while it still descends
//! from the last finalized block (it could yet win a reorg). Once finality
//! passes its fork point it can never become canonical, and it is
//! `Orphaned`.

use super::config::FinalityConfig;
use super::errors::{FinalityError, FinalityResult};
use lc_04_consensus::ChainIndex;
use shared_types::{FinalityStatus, Hash};
use std::collections::HashSet;
use tracing::{debug, info};

/// Last finalized block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    pub hash: Hash,
    pub height: u64,
}

/// Status changes produced by one [`FinalityTracker::update`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FinalityChanges {
    /// Newly finalized, lowest height first.
    pub finalized: Vec<Checkpoint>,
    pub orphaned: Vec<Hash>,
}

impl FinalityChanges {
    pub fn is_empty(&self) -> bool {
        self.finalized.is_empty() && self.orphaned.is_empty()
    }
}

/// Only `Pending` blocks and the last finalized checkpoint are held here.
/// A block leaves the tracker when it reaches a terminal status; callers
/// persist that status from the returned [`FinalityChanges`].
pub struct FinalityTracker {
    config: FinalityConfig,
    pending: HashSet<Hash>,
    last_finalized: Checkpoint,
}

impl FinalityTracker {
    /// Genesis is final from the start.
    pub fn new(config: FinalityConfig, genesis: Hash) -> Self {
        Self {
            config,
            pending: HashSet::new(),
            last_finalized: Checkpoint {
                hash: genesis,
                height: 0,
            },
        }
    }

    pub fn config(&self) -> &FinalityConfig {
        &self.config
    }

    /// Starts tracking a newly validated block as `Pending`.
    pub fn track(&mut self, hash: Hash) {
        if hash != self.last_finalized.hash {
            self.pending.insert(hash);
        }
    }

    /// Status of a block the tracker still holds: a pending block or the
    /// last finalized one. `None` for anything else.
    pub fn status(&self, hash: &Hash) -> Option<FinalityStatus> {
        if self.pending.contains(hash) {
            Some(FinalityStatus::Pending)
        } else if *hash == self.last_finalized.hash {
            Some(FinalityStatus::Finalized)
        } else {
            None
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn last_finalized(&self) -> Checkpoint {
        self.last_finalized
    }

    /// True for canonical blocks at or below the last finalized height.
    pub fn is_finalized(&self, chain: &ChainIndex, hash: &Hash) -> bool {
        chain.is_canonical(hash)
            && chain
                .get(hash)
                .is_some_and(|entry| entry.height <= self.last_finalized.height)
    }

    fn transition(&mut self, hash: &Hash, to: FinalityStatus) -> FinalityResult<()> {
        if to != FinalityStatus::Pending && self.pending.remove(hash) {
            return Ok(());
        }
        match self.status(hash) {
            Some(from) => Err(FinalityError::InvalidTransition {
                hash: *hash,
                from,
                to,
            }),
            None => Err(FinalityError::UnknownBlock(*hash)),
        }
    }

    /// Finalizes canonical blocks that reached the threshold and re-evaluates
    /// every pending block against the current canonical chain.
    pub fn update(&mut self, chain: &ChainIndex) -> FinalityResult<FinalityChanges> {
        let mut changes = FinalityChanges::default();

        if let Some(target) = chain
            .height()
            .checked_sub(self.config.confirmation_threshold)
        {
            for height in self.last_finalized.height + 1..=target {
                let Some(hash) = chain.canonical_hash(height) else {
                    break;
                };
                self.track(hash);
                self.transition(&hash, FinalityStatus::Finalized)?;
                let checkpoint = Checkpoint { hash, height };
                self.last_finalized = checkpoint;
                changes.finalized.push(checkpoint);
                info!(block = %hex::encode(hash), height, "block finalized");
            }
        }

        let barrier = self.last_finalized.hash;
        let orphans: Vec<Hash> = self
            .pending
            .iter()
            .copied()
            .filter(|hash| !chain.is_canonical(hash) && !chain.is_ancestor(&barrier, hash))
            .collect();
        for hash in orphans {
            self.transition(&hash, FinalityStatus::Orphaned)?;
            debug!(block = %hex::encode(hash), "block orphaned");
            changes.orphaned.push(hash);
        }
        changes.orphaned.sort_unstable();

        Ok(changes)
    }

    /// Rejects a reorg whose common ancestor lies below the last finalized
    /// block.
    pub fn guard_reorg(&self, ancestor_height: u64) -> FinalityResult<()> {
        if ancestor_height < self.last_finalized.height {
            return Err(FinalityError::CrossesFinality {
                ancestor_height,
                finalized_height: self.last_finalized.height,
            });
        }
        Ok(())
    }
}
