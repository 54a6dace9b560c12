//! # Event Subscriptions
//!
//! Subscribers see events in the order the writer committed them.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use node_runtime::LedgerApi;
    use shared_bus::{EventFilter, EventTopic, LedgerEvent};
    use shared_crypto::Secp256k1KeyPair;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_submit_then_produce_order() {
        let a = Secp256k1KeyPair::generate();
        let ledger = ledger(&[&a], 1000);
        let mut sub = ledger.subscribe(EventFilter::all());

        let tx = transfer(&a, BOB, 0, 10, 1);
        ledger.submit_transaction(tx.clone()).await.unwrap();
        let block = ledger.produce_block(PRODUCER, 1).unwrap();

        match sub.recv().await.unwrap() {
            LedgerEvent::NewPendingTransaction { hash, from, nonce } => {
                assert_eq!(hash, tx.hash());
                assert_eq!(from, a.address());
                assert_eq!(nonce, 0);
            }
            other => panic!("expected pending transaction, got {other:?}"),
        }
        match sub.recv().await.unwrap() {
            LedgerEvent::NewBlock { hash, tx_hashes, .. } => {
                assert_eq!(hash, block.hash());
                assert_eq!(tx_hashes, vec![tx.hash()]);
            }
            other => panic!("expected new block, got {other:?}"),
        }
        match sub.recv().await.unwrap() {
            LedgerEvent::Log {
                tx_hash,
                block_hash,
                block_height,
                log_index,
                log,
            } => {
                assert_eq!(tx_hash, tx.hash());
                assert_eq!(block_hash, block.hash());
                assert_eq!(block_height, 1);
                assert_eq!(log_index, 0);
                assert_eq!(log.address, BOB);
            }
            other => panic!("expected log, got {other:?}"),
        }
        assert!(sub.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_log_filter_by_address() {
        let a = Secp256k1KeyPair::generate();
        let ledger = ledger(&[&a], 1000);
        let elsewhere = [0xEE; 20];
        let mut logs = ledger.event_stream(
            EventFilter::topics(vec![EventTopic::Logs]).with_addresses(vec![elsewhere]),
        );

        ledger.submit_transaction(transfer(&a, BOB, 0, 10, 1)).await.unwrap();
        ledger.submit_transaction(transfer(&a, elsewhere, 1, 10, 1)).await.unwrap();
        ledger.produce_block(PRODUCER, 1).unwrap();

        match logs.next().await {
            Some(LedgerEvent::Log { log, .. }) => assert_eq!(log.address, elsewhere),
            other => panic!("expected log, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reorg_event_precedes_new_blocks() {
        let a = Secp256k1KeyPair::generate();
        let ledger = ledger(&[&a], 1000);
        let genesis = canonical_hash(&ledger, 0).await.unwrap();
        let original = ledger.produce_block(PRODUCER, 1).unwrap();

        let fork1 = ledger.build_block(&genesis, RIVAL, 2, vec![]).unwrap().block;
        ledger.import_block(fork1.clone()).unwrap();

        let mut chain = ledger.subscribe(EventFilter::topics(vec![EventTopic::Chain]));
        let fork2 = ledger.build_block(&fork1.hash(), RIVAL, 3, vec![]).unwrap().block;
        ledger.import_block(fork2.clone()).unwrap();

        match chain.recv().await.unwrap() {
            LedgerEvent::ChainReorganized {
                common_ancestor,
                reverted,
                applied,
                new_tip,
            } => {
                assert_eq!(common_ancestor, genesis);
                assert_eq!(reverted, vec![original.hash()]);
                assert_eq!(applied, vec![fork1.hash(), fork2.hash()]);
                assert_eq!(new_tip, fork2.hash());
            }
            other => panic!("expected reorg, got {other:?}"),
        }
        for expected in [fork1.hash(), fork2.hash()] {
            assert!(matches!(
                chain.recv().await.unwrap(),
                LedgerEvent::NewBlock { hash, .. } if hash == expected
            ));
        }
    }
}
