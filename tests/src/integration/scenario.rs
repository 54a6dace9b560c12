//! # Worked Example
//!
//! Genesis funds A with 1000. T1 moves 100 to B for a fee of 1, a replay of
//! T1 is refused, block 1 finalizes after six descendants, and a longer fork
//! from genesis presented afterwards cannot displace it.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use lc_03_tx_pool::Placement;
    use node_runtime::{LedgerApi, LedgerError};
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::{BlockId, ErrorClass, ErrorKind, FinalityStatus, U256};

    #[tokio::test]
    async fn test_transfer_replay_finality_and_late_fork() {
        let a = Secp256k1KeyPair::generate();
        let ledger = ledger(&[&a], 1000);
        let genesis = canonical_hash(&ledger, 0).await.unwrap();

        let t1 = transfer(&a, BOB, 0, 100, 1);
        let submitted = ledger.submit_transaction(t1.clone()).await.unwrap();
        assert_eq!(submitted.placement, Placement::Ready);

        let block1 = ledger.produce_block(PRODUCER, 1).unwrap();
        assert_eq!(block1.height(), 1);
        assert_eq!(block1.transactions, vec![t1.clone()]);

        assert_eq!(ledger.get_balance(&a.address()).await.unwrap(), U256::from(899));
        assert_eq!(ledger.get_balance(&BOB).await.unwrap(), U256::from(100));
        // Base reward 50 plus the fee.
        assert_eq!(ledger.get_balance(&PRODUCER).await.unwrap(), U256::from(51));

        let replay = ledger.submit_transaction(t1.clone()).await.unwrap_err();
        assert_eq!(replay.kind(), ErrorKind::StaleOrdering);

        for t in 2..=6 {
            ledger.produce_block(PRODUCER, t).unwrap();
        }
        assert_eq!(
            ledger.finality_status(&block1.hash()).unwrap(),
            Some(FinalityStatus::Pending)
        );
        ledger.produce_block(PRODUCER, 7).unwrap();
        assert_eq!(
            ledger.finality_status(&block1.hash()).unwrap(),
            Some(FinalityStatus::Finalized)
        );

        // Block 1' competes with block 1 and would need to be longer.
        let fork1 = ledger
            .build_block(&genesis, RIVAL, 1, vec![])
            .unwrap()
            .block;
        let err = ledger.import_block(fork1).unwrap_err();
        assert!(matches!(err, LedgerError::Finality(_)));
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);

        assert_eq!(ledger.head().height, 7);
        let view = ledger.get_block(BlockId::Height(1), false).await.unwrap().unwrap();
        assert_eq!(view.hash, block1.hash());
        assert_eq!(view.finality, FinalityStatus::Finalized);
        assert_eq!(
            ledger.get_transaction_receipt(&t1.hash()).await.unwrap().unwrap().block_hash,
            block1.hash()
        );
    }

    #[tokio::test]
    async fn test_future_nonce_waits_for_gap() {
        let a = Secp256k1KeyPair::generate();
        let ledger = ledger(&[&a], 1000);

        let later = transfer(&a, BOB, 1, 10, 1);
        assert_eq!(
            ledger.submit_transaction(later.clone()).await.unwrap().placement,
            Placement::Queued
        );
        assert!(ledger.produce_block(PRODUCER, 1).unwrap().transactions.is_empty());

        let first = transfer(&a, BOB, 0, 10, 1);
        ledger.submit_transaction(first.clone()).await.unwrap();
        let block = ledger.produce_block(PRODUCER, 2).unwrap();
        assert_eq!(block.transactions, vec![first, later]);
        assert_eq!(ledger.get_account(&a.address()).await.unwrap().nonce, 2);
    }

    #[tokio::test]
    async fn test_unfunded_transfer_is_refused() {
        let a = Secp256k1KeyPair::generate();
        let ledger = ledger(&[&a], 1000);

        let err = ledger
            .submit_transaction(transfer(&a, BOB, 0, 1000, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StaleOrdering);
        assert_eq!(ledger.get_balance(&a.address()).await.unwrap(), U256::from(1000));
    }
}
