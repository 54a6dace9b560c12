/// Finality configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalityConfig {
    /// Canonical descendants a block needs before it is final.
    pub confirmation_threshold: u64,
}

impl Default for FinalityConfig {
    fn default() -> Self {
        Self {
            confirmation_threshold: 6,
        }
    }
}

impl FinalityConfig {
    pub fn for_testing() -> Self {
        Self {
            confirmation_threshold: 2,
        }
    }
}
