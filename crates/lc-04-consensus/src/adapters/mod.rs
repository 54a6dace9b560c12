//! Driven adapters for the consensus engine.

pub mod memory_store;

pub use memory_store::InMemoryBlockStore;
