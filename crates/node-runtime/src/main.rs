//! # Ledger Node
//!
//! Single-node ledger with a local block producer.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `LEDGER_*` environment variables
//! 2. Build genesis and wire the subsystems
//! 3. Produce a block every `LEDGER_BLOCK_INTERVAL_MS` until Ctrl+C

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use node_runtime::{Ledger, LedgerApi, NodeConfig};
use shared_bus::{EventFilter, EventTopic, LedgerEvent, SubscriptionError};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

async fn run_producer(ledger: &Ledger) {
    let producer = ledger.config().producer.address;
    let mut interval = tokio::time::interval(ledger.config().producer.block_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match ledger.produce_block(producer, unix_now()) {
            Ok(block) => info!(
                height = block.height(),
                txs = block.transactions.len(),
                "produced block"
            ),
            Err(e) => error!(error = %e, "block production failed"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = NodeConfig::from_env().context("invalid configuration")?;
    let ledger = Ledger::new(config).context("failed to initialize ledger")?;

    let mut finality = ledger.subscribe(EventFilter::topics(vec![EventTopic::Finality]));
    tokio::spawn(async move {
        loop {
            match finality.recv().await {
                Ok(LedgerEvent::BlockFinalized { hash, height }) => {
                    info!(block = %hex::encode(hash), height, "finalized")
                }
                Ok(LedgerEvent::BlockOrphaned { hash }) => {
                    warn!(block = %hex::encode(hash), "orphaned")
                }
                Ok(_) => {}
                Err(SubscriptionError::Lagged(missed)) => warn!(missed, "finality log lagged"),
                Err(SubscriptionError::Closed) => break,
            }
        }
    });

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::select! {
        _ = run_producer(&ledger) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!(height = ledger.head().height, "shutting down");
        }
    }

    Ok(())
}
