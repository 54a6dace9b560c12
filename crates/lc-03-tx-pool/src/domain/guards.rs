//! Per-sender serialization of admission.
//!
//! Two submissions from the same sender must not interleave their
//! read-state / check-nonce / insert sequence, or both could pass a balance
//! check that only one of them can satisfy. Different senders proceed in
//! parallel.

use super::entities::Address;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lock table keyed by sender address.
#[derive(Debug, Default)]
pub struct SenderGuards {
    locks: Mutex<HashMap<Address, Arc<AsyncMutex<()>>>>,
}

/// Held while a sender's submission is in flight.
pub struct SenderGuard {
    _guard: OwnedMutexGuard<()>,
}

impl SenderGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other submission from `sender` is in flight.
    pub async fn lock(&self, sender: Address) -> SenderGuard {
        let lock = {
            let mut locks = self.locks.lock();
            // Drop entries nobody is waiting on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(sender).or_default())
        };
        SenderGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of senders with a lock entry.
    pub fn tracked(&self) -> usize {
        self.locks.lock().len()
    }
}
