//! # Reorganization
//!
//! Competing branches imported through the public ledger surface.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use node_runtime::api::ImportOutcome;
    use node_runtime::LedgerApi;
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::{BlockId, FinalityStatus, U256};

    #[tokio::test]
    async fn test_revert_restores_balances_and_nonces() {
        let a = Secp256k1KeyPair::generate();
        let c = Secp256k1KeyPair::generate();
        let ledger = ledger(&[&a, &c], 1000);
        let genesis = canonical_hash(&ledger, 0).await.unwrap();

        let from_a = transfer(&a, BOB, 0, 300, 2);
        ledger.submit_transaction(from_a.clone()).await.unwrap();
        let mined = ledger.produce_block(PRODUCER, 1).unwrap();
        assert_eq!(ledger.get_balance(&a.address()).await.unwrap(), U256::from(698));

        let from_c = transfer(&c, BOB, 0, 40, 1);
        let fork1 = ledger
            .build_block(&genesis, RIVAL, 2, vec![from_c.clone()])
            .unwrap()
            .block;
        assert!(matches!(
            ledger.import_block(fork1.clone()).unwrap(),
            ImportOutcome::SideBranch { .. }
        ));
        let tip = extend(&ledger, fork1.hash(), RIVAL, 1, 3);

        assert_eq!(ledger.head().hash, tip);
        let account = ledger.get_account(&a.address()).await.unwrap();
        assert_eq!(account.balance, U256::from(1000));
        assert_eq!(account.nonce, 0);
        assert_eq!(ledger.get_balance(&c.address()).await.unwrap(), U256::from(959));
        assert_eq!(ledger.get_balance(&BOB).await.unwrap(), U256::from(40));
        assert_eq!(ledger.get_balance(&PRODUCER).await.unwrap(), U256::zero());
        assert_eq!(ledger.get_balance(&RIVAL).await.unwrap(), U256::from(101));

        assert!(ledger.pool().contains(&from_a.hash()));
        assert!(ledger.get_transaction_receipt(&from_a.hash()).await.unwrap().is_none());
        let view = ledger
            .get_block(BlockId::Hash(mined.hash()), false)
            .await
            .unwrap()
            .unwrap();
        assert!(!view.canonical);
    }

    #[tokio::test]
    async fn test_transaction_on_both_branches_is_not_returned() {
        let a = Secp256k1KeyPair::generate();
        let ledger = ledger(&[&a], 1000);
        let genesis = canonical_hash(&ledger, 0).await.unwrap();

        let tx = transfer(&a, BOB, 0, 10, 1);
        ledger.submit_transaction(tx.clone()).await.unwrap();
        ledger.produce_block(PRODUCER, 1).unwrap();

        let fork1 = ledger
            .build_block(&genesis, RIVAL, 2, vec![tx.clone()])
            .unwrap()
            .block;
        ledger.import_block(fork1.clone()).unwrap();
        extend(&ledger, fork1.hash(), RIVAL, 1, 3);

        assert!(!ledger.pool().contains(&tx.hash()));
        let receipt = ledger.get_transaction_receipt(&tx.hash()).await.unwrap().unwrap();
        assert_eq!(receipt.block_hash, fork1.hash());
        assert_eq!(ledger.get_account(&a.address()).await.unwrap().nonce, 1);
    }

    #[tokio::test]
    async fn test_switch_back_reapplies_original_branch() {
        let a = Secp256k1KeyPair::generate();
        let ledger = ledger(&[&a], 1000);
        let genesis = canonical_hash(&ledger, 0).await.unwrap();

        let tx = transfer(&a, BOB, 0, 10, 1);
        ledger.submit_transaction(tx.clone()).await.unwrap();
        let original = ledger.produce_block(PRODUCER, 1).unwrap();

        let rival_tip = extend(&ledger, genesis, RIVAL, 2, 10);
        assert_eq!(ledger.head().hash, rival_tip);
        assert!(ledger.pool().contains(&tx.hash()));

        let original_tip = extend(&ledger, original.hash(), PRODUCER, 2, 20);
        assert_eq!(ledger.head().hash, original_tip);
        assert_eq!(ledger.head().height, 3);
        assert!(!ledger.pool().contains(&tx.hash()));
        assert_eq!(ledger.get_balance(&BOB).await.unwrap(), U256::from(10));
        assert_eq!(canonical_hash(&ledger, 1).await, Some(original.hash()));
        assert_eq!(
            ledger.finality_status(&rival_tip).unwrap(),
            Some(FinalityStatus::Pending)
        );
    }
}
