use crate::domain::TrieResult;
use crate::ports::TrieDatabase;
use parking_lot::RwLock;
use shared_types::Hash;
use std::collections::HashMap;

/// In-memory implementation of TrieDatabase.
#[derive(Default)]
pub struct InMemoryTrieDb {
    nodes: RwLock<HashMap<Hash, Vec<u8>>>,
}

impl InMemoryTrieDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

impl TrieDatabase for InMemoryTrieDb {
    fn get_node(&self, hash: &Hash) -> TrieResult<Option<Vec<u8>>> {
        Ok(self.nodes.read().get(hash).cloned())
    }

    fn put_node(&self, hash: Hash, data: Vec<u8>) -> TrieResult<()> {
        self.nodes.write().insert(hash, data);
        Ok(())
    }

    fn batch_put(&self, batch: Vec<(Hash, Vec<u8>)>) -> TrieResult<()> {
        let mut nodes = self.nodes.write();
        for (hash, data) in batch {
            nodes.insert(hash, data);
        }
        Ok(())
    }

    fn delete_node(&self, hash: &Hash) -> TrieResult<()> {
        self.nodes.write().remove(hash);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trie_db_operations() {
        let db = InMemoryTrieDb::new();
        let hash = [0xAB; 32];
        let data = vec![1, 2, 3, 4];

        // Put
        db.put_node(hash, data.clone()).unwrap();

        // Get
        let retrieved = db.get_node(&hash).unwrap();
        assert_eq!(retrieved, Some(data));

        // Delete
        db.delete_node(&hash).unwrap();
        let retrieved = db.get_node(&hash).unwrap();
        assert_eq!(retrieved, None);
    }

    #[test]
    fn test_batch_put() {
        let db = InMemoryTrieDb::new();
        db.batch_put(vec![([1; 32], vec![1]), ([2; 32], vec![2])])
            .unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(db.get_node(&[2; 32]).unwrap(), Some(vec![2]));
    }
}
