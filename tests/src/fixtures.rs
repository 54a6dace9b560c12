//! Shared fixtures for the integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use node_runtime::adapters::{BlockFetcher, FetchError};
use node_runtime::api::BlockTransactions;
use node_runtime::{GenesisConfig, Ledger, LedgerApi, LedgerPorts, NodeConfig};
use shared_crypto::Secp256k1KeyPair;
use shared_types::{Address, Block, BlockId, Hash, SignedTransaction, UnsignedTransaction, U256};

pub const BOB: Address = [0xB0; 20];
pub const PRODUCER: Address = [0xAA; 20];
pub const RIVAL: Address = [0xCC; 20];

/// Genesis funding `accounts` with `balance` each.
pub fn funded_config(accounts: &[&Secp256k1KeyPair], balance: u64) -> NodeConfig {
    NodeConfig::for_testing(GenesisConfig::with_balances(
        accounts.iter().map(|k| (k.address(), U256::from(balance))),
    ))
}

pub fn ledger(accounts: &[&Secp256k1KeyPair], balance: u64) -> Ledger {
    Ledger::new(funded_config(accounts, balance)).unwrap()
}

pub fn ledger_with_fetcher(config: NodeConfig, fetcher: Arc<dyn BlockFetcher>) -> Ledger {
    Ledger::with_ports(
        config,
        LedgerPorts {
            fetcher: Some(fetcher),
            ..LedgerPorts::default()
        },
    )
    .unwrap()
}

pub fn transfer(
    from: &Secp256k1KeyPair,
    to: Address,
    nonce: u64,
    value: u64,
    fee: u64,
) -> SignedTransaction {
    UnsignedTransaction {
        from: from.address(),
        to,
        value: U256::from(value),
        nonce,
        fee: U256::from(fee),
        data: vec![],
    }
    .sign(from)
    .unwrap()
}

/// Builds and imports `count` empty blocks on `parent`, returning the last.
pub fn extend(ledger: &Ledger, parent: Hash, producer: Address, count: u64, from_ts: u64) -> Hash {
    let mut parent = parent;
    for n in 0..count {
        let block = ledger
            .build_block(&parent, producer, from_ts + n, vec![])
            .unwrap()
            .block;
        parent = block.hash();
        let _ = ledger.import_block(block);
    }
    parent
}

pub async fn canonical_hash(ledger: &Ledger, height: u64) -> Option<Hash> {
    ledger
        .get_block(BlockId::Height(height), false)
        .await
        .unwrap()
        .map(|view| view.hash)
}

/// Serves blocks out of another node's store, optionally after a delay.
pub struct PeerFetcher {
    pub source: Arc<Ledger>,
    pub delay: Option<Duration>,
}

impl PeerFetcher {
    pub fn new(source: Arc<Ledger>) -> Self {
        Self {
            source,
            delay: None,
        }
    }
}

#[async_trait]
impl BlockFetcher for PeerFetcher {
    async fn fetch_block(&self, hash: &Hash) -> Result<Option<Block>, FetchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let view = self
            .source
            .get_block(BlockId::Hash(*hash), true)
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;
        Ok(view.map(|view| Block {
            header: view.header,
            transactions: match view.transactions {
                BlockTransactions::Full(txs) => txs,
                BlockTransactions::Hashes(_) => Vec::new(),
            },
        }))
    }
}
