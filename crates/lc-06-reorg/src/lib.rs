//! # Reorganization Manager
//!
//! Switches the canonical chain to a strictly longer competing branch,
//! never across the last finalized block.
//!
//! ```text
//!            A1 - A2 - A3          (canonical, reverted newest first)
//!           /
//!   G - ... X                      X = lowest common ancestor
//!           \
//!            B1 - B2 - B3 - B4     (competing, replayed oldest first)
//! ```
//!
//! Reverted transactions missing from the winning branch are handed back
//! for the pool.

pub mod domain;

pub use domain::*;
