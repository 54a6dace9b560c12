//! Dynamic maximum block size.
//!
//! The limit is recomputed every `adjustment_interval` blocks. For a block at
//! height `h`, the governing boundary is `b = ((h - 1) / interval) * interval`.
//! Until the first full window (`b == 0`) the initial limit applies; after
//! that the limit is `adjustment_percent` of the average size of blocks
//! `b - interval + 1 ..= b` on the block's own ancestry, floored at
//! `min_block_size`.

use super::config::BlockSizeConfig;
use std::ops::RangeInclusive;

#[derive(Clone, Debug)]
pub struct BlockSizePolicy {
    config: BlockSizeConfig,
}

impl BlockSizePolicy {
    pub fn new(config: BlockSizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BlockSizeConfig {
        &self.config
    }

    /// Heights whose sizes determine the limit at `height`, or `None` if the
    /// initial limit applies.
    pub fn window_for(&self, height: u64) -> Option<RangeInclusive<u64>> {
        let interval = self.config.adjustment_interval.max(1);
        let boundary = (height.saturating_sub(1) / interval) * interval;
        if boundary == 0 {
            return None;
        }
        Some(boundary + 1 - interval..=boundary)
    }

    /// Limit given the sizes of the blocks in [`Self::window_for`].
    pub fn limit_from_window(&self, window_sizes: &[u64]) -> u64 {
        if window_sizes.is_empty() {
            return self.config.initial_block_size;
        }
        let total: u128 = window_sizes.iter().map(|s| u128::from(*s)).sum();
        let average = total / window_sizes.len() as u128;
        let scaled = average * u128::from(self.config.adjustment_percent) / 100;
        u64::try_from(scaled)
            .unwrap_or(u64::MAX)
            .max(self.config.min_block_size)
    }

    /// Limit at `height`, reading ancestor sizes through `size_at`.
    ///
    /// Returns `None` if an ancestor in the window is unknown.
    pub fn limit_for<F>(&self, height: u64, mut size_at: F) -> Option<u64>
    where
        F: FnMut(u64) -> Option<u64>,
    {
        match self.window_for(height) {
            None => Some(self.config.initial_block_size),
            Some(window) => {
                let sizes = window.map(&mut size_at).collect::<Option<Vec<u64>>>()?;
                Some(self.limit_from_window(&sizes))
            }
        }
    }
}

impl Default for BlockSizePolicy {
    fn default() -> Self {
        Self::new(BlockSizeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_initial_limit_until_first_window() {
        let policy = BlockSizePolicy::default();
        for height in 1..=10 {
            assert_eq!(policy.window_for(height), None);
            assert_eq!(policy.limit_for(height, |_| None), Some(1_000_000));
        }
        assert_eq!(policy.window_for(11), Some(1..=10));
        assert_eq!(policy.window_for(20), Some(1..=10));
        assert_eq!(policy.window_for(21), Some(11..=20));
    }

    #[test]
    fn test_limit_is_120_percent_of_average() {
        let policy = BlockSizePolicy::default();
        // Average 500_000 -> 600_000.
        assert_eq!(policy.limit_for(11, |_| Some(500_000)), Some(600_000));
        // Mixed window.
        let sizes = [200_000, 400_000, 600_000, 800_000, 1_000_000];
        assert_eq!(policy.limit_from_window(&sizes), 720_000);
    }

    #[test]
    fn test_limit_has_floor() {
        let policy = BlockSizePolicy::default();
        assert_eq!(policy.limit_for(11, |_| Some(1_000)), Some(100_000));
    }

    #[test]
    fn test_unknown_ancestor() {
        let policy = BlockSizePolicy::default();
        assert_eq!(
            policy.limit_for(11, |h| if h == 5 { None } else { Some(1) }),
            None
        );
    }

    proptest! {
        #[test]
        fn prop_limit_respects_floor_and_scale(
            sizes in proptest::collection::vec(0u64..5_000_000, 10),
        ) {
            let policy = BlockSizePolicy::default();
            let limit = policy.limit_from_window(&sizes);
            let average = sizes.iter().sum::<u64>() / sizes.len() as u64;
            prop_assert!(limit >= 100_000);
            prop_assert_eq!(limit, (average * 120 / 100).max(100_000));
        }
    }
}
