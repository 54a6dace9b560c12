use crate::domain::TrieResult;
use shared_types::Hash;

/// Content-addressed node store.
///
/// Nodes are keyed by the Keccak-256 hash of their encoding and are never
/// mutated once written, so every historical root stays readable for as long
/// as its nodes are kept.
pub trait TrieDatabase: Send + Sync {
    fn get_node(&self, hash: &Hash) -> TrieResult<Option<Vec<u8>>>;
    fn put_node(&self, hash: Hash, data: Vec<u8>) -> TrieResult<()>;
    fn batch_put(&self, nodes: Vec<(Hash, Vec<u8>)>) -> TrieResult<()>;
    fn delete_node(&self, hash: &Hash) -> TrieResult<()>;
}
