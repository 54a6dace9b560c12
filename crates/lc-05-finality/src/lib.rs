//! # Finality Tracker
//!
//! Classifies blocks by confirmation depth.
//!
//! ```text
//! Pending --(tip - height >= threshold, canonical)--> Finalized
//! Pending --(no longer descends from last finalized)--> Orphaned
//! ```
//!
//! Both outcomes are terminal. The last finalized block doubles as the
//! reversion shield: [`FinalityTracker::guard_reorg`] refuses any reorg whose
//! common ancestor lies below it.

pub mod domain;

pub use domain::*;
