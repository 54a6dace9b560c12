//! # Finality
//!
//! Six canonical descendants make a block permanent.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use node_runtime::api::ImportOutcome;
    use node_runtime::LedgerApi;
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::{ErrorClass, ErrorKind, FinalityStatus};

    #[tokio::test]
    async fn test_finalized_block_survives_longer_fork() {
        let a = Secp256k1KeyPair::generate();
        let ledger = ledger(&[&a], 1000);
        let genesis = canonical_hash(&ledger, 0).await.unwrap();

        let blocks: Vec<_> = (1..=7)
            .map(|t| ledger.produce_block(PRODUCER, t).unwrap())
            .collect();
        assert_eq!(
            ledger.finality_status(&blocks[0].hash()).unwrap(),
            Some(FinalityStatus::Finalized)
        );

        // Presented from below the finalized block: refused outright.
        let below = ledger.build_block(&genesis, RIVAL, 1, vec![]).unwrap().block;
        let err = ledger.import_block(below).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);

        // Forked at the finalized block itself: allowed once longer.
        let fork_tip = extend(&ledger, blocks[0].hash(), RIVAL, 7, 100);
        assert_eq!(ledger.head().hash, fork_tip);
        assert_eq!(ledger.head().height, 8);
        assert_eq!(canonical_hash(&ledger, 1).await, Some(blocks[0].hash()));
        assert_eq!(
            ledger.finality_status(&blocks[0].hash()).unwrap(),
            Some(FinalityStatus::Finalized)
        );

        // The displaced tail can never come back.
        assert_eq!(
            ledger.finality_status(&blocks[1].hash()).unwrap(),
            Some(FinalityStatus::Orphaned)
        );
        assert_eq!(
            ledger.finality_status(&blocks[6].hash()).unwrap(),
            Some(FinalityStatus::Orphaned)
        );
    }

    #[tokio::test]
    async fn test_wrong_state_root_is_never_finalized() {
        let a = Secp256k1KeyPair::generate();
        let ledger = ledger(&[&a], 1000);
        let genesis = canonical_hash(&ledger, 0).await.unwrap();

        let tx = transfer(&a, BOB, 0, 5, 1);
        let mut bad = ledger
            .build_block(&genesis, RIVAL, 1, vec![tx])
            .unwrap()
            .block;
        bad.header.state_root = [0x11; 32];

        let err = ledger.import_block(bad.clone()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        // Remembered as invalid.
        assert!(ledger.import_block(bad.clone()).is_err());

        for t in 1..=8 {
            ledger.produce_block(PRODUCER, t).unwrap();
        }
        assert_eq!(ledger.finality_status(&bad.hash()).unwrap(), None);
        assert_ne!(canonical_hash(&ledger, 1).await, Some(bad.hash()));
    }

    #[tokio::test]
    async fn test_side_branch_is_orphaned_by_finality() {
        let a = Secp256k1KeyPair::generate();
        let ledger = ledger(&[&a], 1000);
        let genesis = canonical_hash(&ledger, 0).await.unwrap();

        ledger.produce_block(PRODUCER, 1).unwrap();
        let side = ledger.build_block(&genesis, RIVAL, 2, vec![]).unwrap().block;
        assert_eq!(
            ledger.import_block(side.clone()).unwrap(),
            ImportOutcome::SideBranch { hash: side.hash() }
        );
        assert_eq!(
            ledger.finality_status(&side.hash()).unwrap(),
            Some(FinalityStatus::Pending)
        );

        for t in 3..=8 {
            ledger.produce_block(PRODUCER, t).unwrap();
        }
        assert_eq!(
            ledger.finality_status(&side.hash()).unwrap(),
            Some(FinalityStatus::Orphaned)
        );
    }
}
