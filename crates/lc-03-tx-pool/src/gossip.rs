//! # Gossip Relay
//!
//! Forwards accepted transactions to connected peers through a
//! [`GossipTransport`]. Each peer has a bounded memory of hashes it already
//! knows, either because it announced them to us or because we sent them, and
//! a transaction is never sent twice to the same peer while remembered.
//!
//! The memory is capped at [`GossipConfig::known_per_peer`] hashes. Once a
//! hash is pushed out by newer ones, the peer may be sent that transaction
//! again. Memory per peer stays bounded at the cost of an occasional
//! duplicate send, which the receiving pool drops as `DuplicateTransaction`.

use crate::domain::Hash;
use crate::ports::{GossipTransport, PeerId};
use parking_lot::Mutex;
use shared_types::SignedTransaction;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

/// Relay limits.
#[derive(Clone, Debug)]
pub struct GossipConfig {
    /// Hashes remembered per peer before the oldest are forgotten.
    pub known_per_peer: usize,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            known_per_peer: 4096,
        }
    }
}

impl GossipConfig {
    pub fn for_testing() -> Self {
        Self { known_per_peer: 4 }
    }
}

/// FIFO-bounded hash set. A hash evicted from it counts as unknown again.
#[derive(Debug, Default)]
struct KnownHashes {
    set: HashSet<Hash>,
    order: VecDeque<Hash>,
}

impl KnownHashes {
    /// Returns false if already known.
    fn insert(&mut self, hash: Hash, capacity: usize) -> bool {
        if !self.set.insert(hash) {
            return false;
        }
        self.order.push_back(hash);
        while self.order.len() > capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.set.remove(&oldest);
            }
        }
        true
    }

    fn contains(&self, hash: &Hash) -> bool {
        self.set.contains(hash)
    }
}

pub struct GossipRelay {
    transport: Arc<dyn GossipTransport>,
    config: GossipConfig,
    known: Mutex<HashMap<PeerId, KnownHashes>>,
}

impl GossipRelay {
    pub fn new(transport: Arc<dyn GossipTransport>, config: GossipConfig) -> Self {
        Self {
            transport,
            config,
            known: Mutex::new(HashMap::new()),
        }
    }

    /// Record that `peer` already has `hash`.
    pub fn mark_known(&self, peer: PeerId, hash: Hash) {
        self.known
            .lock()
            .entry(peer)
            .or_default()
            .insert(hash, self.config.known_per_peer);
    }

    pub fn is_known(&self, peer: &PeerId, hash: &Hash) -> bool {
        self.known
            .lock()
            .get(peer)
            .is_some_and(|known| known.contains(hash))
    }

    /// Sends `tx` to every connected peer that does not already know it,
    /// skipping `origin`. Returns the number of successful sends.
    ///
    /// Send failures are logged and otherwise ignored.
    pub async fn broadcast(&self, tx: &SignedTransaction, origin: Option<PeerId>) -> usize {
        let hash = tx.hash();
        let targets: Vec<PeerId> = {
            let mut known = self.known.lock();
            let peers = self.transport.peers();
            // Forget peers that disconnected.
            known.retain(|peer, _| peers.contains(peer));
            peers
                .into_iter()
                .filter(|peer| Some(*peer) != origin)
                .filter(|peer| {
                    known
                        .entry(*peer)
                        .or_default()
                        .insert(hash, self.config.known_per_peer)
                })
                .collect()
        };

        let mut sent = 0;
        for peer in &targets {
            match self.transport.send(peer, tx).await {
                Ok(()) => sent += 1,
                Err(e) => warn!(
                    peer = %hex::encode(peer),
                    tx = %hex::encode(hash),
                    error = %e,
                    "gossip send failed"
                ),
            }
        }
        debug!(tx = %hex::encode(hash), sent, "gossiped transaction");
        sent
    }
}
