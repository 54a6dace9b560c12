//! # Pool Ordering
//!
//! The drain order is a pure function of pool contents and the seed block
//! hash: reproducible by every peer, but not predictable from fee and
//! sender alone.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use lc_03_tx_pool::{PoolConfig, TransactionPool};
    use proptest::prelude::*;
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::{Hash, SignedTransaction};

    fn pool_of(txs: &[SignedTransaction]) -> TransactionPool {
        let mut pool = TransactionPool::new(PoolConfig::for_testing());
        for (n, tx) in txs.iter().enumerate() {
            pool.submit(tx.clone(), 0, n as u64).unwrap();
        }
        pool
    }

    fn hashes(txs: &[SignedTransaction]) -> Vec<Hash> {
        txs.iter().map(SignedTransaction::hash).collect()
    }

    #[test]
    fn test_equal_fees_drain_identically_in_either_order() {
        let a = Secp256k1KeyPair::generate();
        let b = Secp256k1KeyPair::generate();
        let ta = transfer(&a, BOB, 0, 1, 7);
        let tb = transfer(&b, BOB, 0, 1, 7);
        let seed = [0x5E; 32];

        let forward = pool_of(&[ta.clone(), tb.clone()]).drain_for_block(u64::MAX, &seed);
        let backward = pool_of(&[tb, ta]).drain_for_block(u64::MAX, &seed);
        assert_eq!(hashes(&forward), hashes(&backward));
        assert_eq!(forward.len(), 2);
    }

    #[test]
    fn test_seed_decides_equal_fee_order() {
        let a = Secp256k1KeyPair::generate();
        let b = Secp256k1KeyPair::generate();
        let ta = transfer(&a, BOB, 0, 1, 7);
        let pool = pool_of(&[ta.clone(), transfer(&b, BOB, 0, 1, 7)]);

        let a_first = (0u8..32)
            .filter(|n| pool.drain_for_block(u64::MAX, &[*n; 32])[0].hash() == ta.hash())
            .count();
        assert!(a_first > 0 && a_first < 32, "a first in {a_first} of 32 seeds");
    }

    #[test]
    fn test_higher_fee_drains_first() {
        let a = Secp256k1KeyPair::generate();
        let b = Secp256k1KeyPair::generate();
        let cheap = transfer(&a, BOB, 0, 1, 1);
        let rich = transfer(&b, BOB, 0, 1, 9);

        let drained = pool_of(&[cheap.clone(), rich.clone()]).drain_for_block(u64::MAX, &[1; 32]);
        assert_eq!(hashes(&drained), vec![rich.hash(), cheap.hash()]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_drain_ignores_arrival_order(
            fees in proptest::collection::vec(1u64..4, 2..6),
            seed in any::<[u8; 32]>(),
            rotate in 0usize..6,
        ) {
            let txs: Vec<SignedTransaction> = fees
                .iter()
                .map(|fee| transfer(&Secp256k1KeyPair::generate(), BOB, 0, 1, *fee))
                .collect();
            let mut shuffled = txs.clone();
            shuffled.rotate_left(rotate % txs.len());
            shuffled.reverse();

            let expected = pool_of(&txs).drain_for_block(u64::MAX, &seed);
            let actual = pool_of(&shuffled).drain_for_block(u64::MAX, &seed);
            prop_assert_eq!(hashes(&expected), hashes(&actual));

            // Fees never increase along the drain.
            let drained_fees: Vec<_> = expected.iter().map(|tx| tx.fee).collect();
            prop_assert!(drained_fees.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
