//! # Consensus Metrics
//!
//! Prometheus metrics for block validation and assembly.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! lc-04-consensus = { workspace = true, features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `consensus_blocks_validated_total` - Counter of blocks that passed validation
//! - `consensus_blocks_rejected_total` - Counter of rejected blocks (by reason)
//! - `consensus_validation_latency_seconds` - Histogram of validation times
//! - `consensus_blocks_built_total` - Counter of locally assembled blocks
//! - `consensus_built_block_transactions` - Histogram of transactions per built block

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Histogram,
    IntCounter,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref BLOCKS_VALIDATED: IntCounter = register_int_counter!(
        "consensus_blocks_validated_total",
        "Total number of blocks successfully validated"
    )
    .expect("Failed to create BLOCKS_VALIDATED metric");

    /// Total blocks rejected, labeled by rejection reason
    pub static ref BLOCKS_REJECTED: CounterVec = register_counter_vec!(
        "consensus_blocks_rejected_total",
        "Total number of blocks rejected",
        &["reason"]
    )
    .expect("Failed to create BLOCKS_REJECTED metric");

    pub static ref VALIDATION_LATENCY: Histogram = register_histogram!(
        "consensus_validation_latency_seconds",
        "Time taken to validate a block in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to create VALIDATION_LATENCY metric");

    pub static ref BLOCKS_BUILT: IntCounter = register_int_counter!(
        "consensus_blocks_built_total",
        "Total number of blocks assembled locally"
    )
    .expect("Failed to create BLOCKS_BUILT metric");

    pub static ref BUILT_BLOCK_TXS: Histogram = register_histogram!(
        "consensus_built_block_transactions",
        "Transactions per locally assembled block",
        vec![0.0, 1.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]
    )
    .expect("Failed to create BUILT_BLOCK_TXS metric");
}

#[cfg(feature = "metrics")]
pub fn record_block_validated() {
    BLOCKS_VALIDATED.inc();
}

/// Record a rejected block with reason
#[cfg(feature = "metrics")]
pub fn record_block_rejected(reason: &str) {
    BLOCKS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_validation_latency(seconds: f64) {
    VALIDATION_LATENCY.observe(seconds);
}

#[cfg(feature = "metrics")]
pub fn record_block_built(transactions: usize) {
    BLOCKS_BUILT.inc();
    BUILT_BLOCK_TXS.observe(transactions as f64);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_block_validated() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_validation_latency(_seconds: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_built(_transactions: usize) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_callable() {
        record_block_validated();
        record_block_rejected("test");
        record_validation_latency(1.0);
        record_block_built(3);
    }
}
