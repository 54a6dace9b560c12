//! Outbound (Driven) ports for the transaction pool.

use crate::domain::{GossipError, Timestamp};
use async_trait::async_trait;
use lc_02_execution::TxRejection;
use shared_types::{Account, Address, SignedTransaction};

/// Opaque peer identifier assigned by the transport.
pub type PeerId = [u8; 32];

/// Read access to accounts at the committed head.
pub trait AccountSource: Send + Sync {
    /// The account at `address`, or a zero-balance default if absent.
    ///
    /// Fails only when the state itself cannot be read.
    fn account(&self, address: &Address) -> Result<Account, TxRejection>;
}

/// Peer-to-peer delivery of pool transactions.
#[async_trait]
pub trait GossipTransport: Send + Sync {
    /// Currently connected peers.
    fn peers(&self) -> Vec<PeerId>;

    async fn send(&self, peer: &PeerId, tx: &SignedTransaction) -> Result<(), GossipError>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}
