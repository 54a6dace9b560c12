//! # Ancestor Fetch
//!
//! A block whose ancestors are unknown pulls them from a peer before
//! import. Slow peers surface as unavailable, never as a hang.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::fixtures::*;
    use node_runtime::adapters::FetchError;
    use node_runtime::api::ImportOutcome;
    use node_runtime::{LedgerApi, LedgerError};
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::{ErrorClass, ErrorKind, U256};

    #[tokio::test]
    async fn test_catches_up_through_peer() {
        let a = Secp256k1KeyPair::generate();
        let source = Arc::new(ledger(&[&a], 1000));
        source
            .submit_transaction(transfer(&a, BOB, 0, 25, 1))
            .await
            .unwrap();
        let mut tip = None;
        for t in 1..=4 {
            tip = Some(source.produce_block(PRODUCER, t).unwrap());
        }
        let tip = tip.unwrap();

        let node = ledger_with_fetcher(
            funded_config(&[&a], 1000),
            Arc::new(PeerFetcher::new(Arc::clone(&source))),
        );
        let outcome = node.import_block_with_fetch(tip.clone()).await.unwrap();
        assert_eq!(
            outcome,
            ImportOutcome::Extended {
                hash: tip.hash(),
                height: 4,
            }
        );
        assert_eq!(node.head(), source.head());
        assert_eq!(node.get_balance(&BOB).await.unwrap(), U256::from(25));
    }

    #[tokio::test]
    async fn test_slow_peer_is_unavailable() {
        let a = Secp256k1KeyPair::generate();
        let source = Arc::new(ledger(&[&a], 1000));
        source.produce_block(PRODUCER, 1).unwrap();
        let tip = source.produce_block(PRODUCER, 2).unwrap();

        let config = funded_config(&[&a], 1000);
        let slow = PeerFetcher {
            delay: Some(config.fetch.attempt_timeout * 4),
            ..PeerFetcher::new(source)
        };
        let node = ledger_with_fetcher(config, Arc::new(slow));

        let err = tokio::time::timeout(Duration::from_secs(5), node.import_block_with_fetch(tip))
            .await
            .expect("fetch must give up on its own")
            .unwrap_err();
        assert!(matches!(err, LedgerError::Fetch(FetchError::Unavailable { .. })));
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(node.head().height, 0);
    }

    #[tokio::test]
    async fn test_peer_without_block_is_unavailable() {
        let a = Secp256k1KeyPair::generate();
        let source = Arc::new(ledger(&[&a], 1000));
        let stranger = Secp256k1KeyPair::generate();
        // Different genesis: none of its blocks are known to the node.
        let other = ledger(&[&stranger], 1);
        other.produce_block(PRODUCER, 1).unwrap();
        let orphan = other.produce_block(PRODUCER, 2).unwrap();

        let node = ledger_with_fetcher(
            funded_config(&[&a], 1000),
            Arc::new(PeerFetcher::new(source)),
        );
        let err = node.import_block_with_fetch(orphan).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }
}
