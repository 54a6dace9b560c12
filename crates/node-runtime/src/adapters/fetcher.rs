//! # Retrying Block Fetcher
//!
//! Wraps a [`BlockFetcher`] so that no fetch waits unboundedly: each attempt
//! runs under `tokio::time::timeout`, failures back off exponentially with
//! jitter, and after `max_attempts` the block is reported unavailable.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use shared_types::{Block, Hash};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::ports::{BlockFetcher, FetchError};

/// Timeouts and retry limits for block fetches.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Deadline for a single attempt.
    pub attempt_timeout: Duration,
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per attempt.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Upper bound on random extra delay added to each backoff.
    pub jitter: Duration,
    /// Most unknown ancestors fetched for one imported block.
    pub max_depth: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(5),
            max_attempts: 4,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            jitter: Duration::from_millis(100),
            max_depth: 64,
        }
    }
}

impl FetchConfig {
    pub fn for_testing() -> Self {
        Self {
            attempt_timeout: Duration::from_millis(50),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(20),
            jitter: Duration::ZERO,
            max_depth: 8,
        }
    }

    /// Delay after the `attempt`-th failure (1-based), without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

pub struct RetryingFetcher {
    inner: Arc<dyn BlockFetcher>,
    config: FetchConfig,
}

impl RetryingFetcher {
    pub fn new(inner: Arc<dyn BlockFetcher>, config: FetchConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches the block with exactly `hash`. A block with any other hash
    /// counts as a failed attempt.
    pub async fn fetch(&self, hash: &Hash) -> Result<Block, FetchError> {
        for attempt in 1..=self.config.max_attempts {
            match timeout(self.config.attempt_timeout, self.inner.fetch_block(hash)).await {
                Ok(Ok(Some(block))) if block.hash() == *hash => {
                    debug!(block = %hex::encode(hash), attempt, "fetched block");
                    return Ok(block);
                }
                Ok(Ok(Some(block))) => warn!(
                    wanted = %hex::encode(hash),
                    got = %hex::encode(block.hash()),
                    "peer returned the wrong block"
                ),
                Ok(Ok(None)) => debug!(block = %hex::encode(hash), attempt, "no peer has block"),
                Ok(Err(e)) => warn!(block = %hex::encode(hash), attempt, error = %e, "fetch failed"),
                Err(_) => warn!(
                    block = %hex::encode(hash),
                    attempt,
                    timeout_ms = self.config.attempt_timeout.as_millis() as u64,
                    "fetch timed out"
                ),
            }

            if attempt < self.config.max_attempts {
                sleep(self.delay(attempt)).await;
            }
        }

        Err(FetchError::Unavailable {
            hash: *hash,
            attempts: self.config.max_attempts,
        })
    }

    fn delay(&self, attempt: u32) -> Duration {
        let jitter = self.config.jitter.as_millis() as u64;
        let extra = if jitter == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter)
        };
        self.config.backoff(attempt) + Duration::from_millis(extra)
    }
}
