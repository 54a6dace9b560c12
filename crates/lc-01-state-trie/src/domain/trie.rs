use super::errors::{TrieError, TrieResult};
use super::nibbles::{common_prefix_len, Nibbles};
use super::node::TrieNode;
use crate::ports::TrieDatabase;
use serde::{Deserialize, Serialize};
use shared_crypto::keccak256;
use shared_types::{Hash, EMPTY_TRIE_ROOT};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::trace;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Limits applied to keys and values written to the trie.
#[derive(Clone, Debug)]
pub struct TrieConfig {
    /// Maximum key length in bytes.
    pub max_key_len: usize,
    /// Maximum value length in bytes.
    pub max_value_len: usize,
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self {
            max_key_len: 64,
            max_value_len: 1024 * 1024,
        }
    }
}

// =============================================================================
// PROOFS AND DIFFS
// =============================================================================

/// Merkle proof for one key: the encoded nodes on the path from the root to
/// the node where the lookup terminates. Sibling hashes are carried inside
/// the branch nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrieProof {
    pub nodes: Vec<Vec<u8>>,
}

impl TrieProof {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One key whose value differs between two roots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrieChange {
    pub key: Vec<u8>,
    /// Value under the first root, `None` if absent.
    pub old: Option<Vec<u8>>,
    /// Value under the second root, `None` if absent.
    pub new: Option<Vec<u8>>,
}

// =============================================================================
// PATRICIA MERKLE TRIE
// =============================================================================

/// Copy-on-write Patricia Merkle Trie over a content-addressed node store.
///
/// The trie itself holds no root: every operation takes the root it reads
/// from, and writes return a new root. Prior roots are never invalidated.
#[derive(Clone)]
pub struct PatriciaMerkleTrie {
    db: Arc<dyn TrieDatabase>,
    config: TrieConfig,
}

impl PatriciaMerkleTrie {
    pub fn new(db: Arc<dyn TrieDatabase>) -> Self {
        Self::with_config(db, TrieConfig::default())
    }

    pub fn with_config(db: Arc<dyn TrieDatabase>, config: TrieConfig) -> Self {
        Self { db, config }
    }

    pub fn database(&self) -> &Arc<dyn TrieDatabase> {
        &self.db
    }

    /// Look up `key` under `root`.
    ///
    /// `Ok(None)` means the key is provably absent; a node missing from the
    /// store surfaces as [`TrieError::MissingNode`].
    pub fn get(&self, root: &Hash, key: &[u8]) -> TrieResult<Option<Vec<u8>>> {
        let nibbles = Nibbles::from_bytes(key);
        let mut path = nibbles.as_slice();
        let mut node = self.load(root)?;

        loop {
            match node {
                TrieNode::Empty => return Ok(None),
                TrieNode::Leaf { path: leaf_path, value } => {
                    return Ok((leaf_path.as_slice() == path).then_some(value));
                }
                TrieNode::Extension { path: ext_path, child } => {
                    match path.strip_prefix(ext_path.as_slice()) {
                        Some(rest) => {
                            path = rest;
                            node = self.load(&child)?;
                        }
                        None => return Ok(None),
                    }
                }
                TrieNode::Branch { children, value } => {
                    let Some((&index, rest)) = path.split_first() else {
                        return Ok(value);
                    };
                    match children[index as usize] {
                        Some(child) => {
                            path = rest;
                            node = self.load(&child)?;
                        }
                        None => return Ok(None),
                    }
                }
            }
        }
    }

    /// Write `key = value` on top of `root`, returning the new root.
    pub fn set(&self, root: &Hash, key: &[u8], value: Vec<u8>) -> TrieResult<Hash> {
        self.update(root, vec![(key.to_vec(), Some(value))])
    }

    /// Remove `key` on top of `root`, returning the new root. Removing an
    /// absent key returns `root` unchanged.
    pub fn delete(&self, root: &Hash, key: &[u8]) -> TrieResult<Hash> {
        self.update(root, vec![(key.to_vec(), None)])
    }

    /// Apply a batch of writes (`None` deletes) in order and flush the new
    /// nodes in a single store batch.
    pub fn update(
        &self,
        root: &Hash,
        writes: Vec<(Vec<u8>, Option<Vec<u8>>)>,
    ) -> TrieResult<Hash> {
        let mut session = WriteSession::new(self);
        let mut current = self.load(root)?;

        for (key, value) in writes {
            self.check_key(&key)?;
            let path = Nibbles::from_bytes(&key);
            current = match value {
                Some(value) => {
                    self.check_value(&value)?;
                    session.insert(current, path.as_slice(), value)?
                }
                None => session.remove(current, path.as_slice())?,
            };
        }

        let new_root = session.commit(current)?;
        trace!(root = %hex::encode(root), new_root = %hex::encode(new_root), "trie updated");
        Ok(new_root)
    }

    /// Replay `changes` on top of `root`, writing each change's `new` value.
    pub fn apply_changes(&self, root: &Hash, changes: &[TrieChange]) -> TrieResult<Hash> {
        self.update(
            root,
            changes
                .iter()
                .map(|c| (c.key.clone(), c.new.clone()))
                .collect(),
        )
    }

    /// Undo `changes` on top of `root`, restoring each change's `old` value.
    pub fn revert_changes(&self, root: &Hash, changes: &[TrieChange]) -> TrieResult<Hash> {
        self.update(
            root,
            changes
                .iter()
                .map(|c| (c.key.clone(), c.old.clone()))
                .collect(),
        )
    }

    /// Build a proof for `key` under `root`. Works for absent keys too.
    pub fn generate_proof(&self, root: &Hash, key: &[u8]) -> TrieResult<TrieProof> {
        let nibbles = Nibbles::from_bytes(key);
        let mut path = nibbles.as_slice();
        let mut nodes = Vec::new();
        let mut hash = *root;

        while hash != EMPTY_TRIE_ROOT {
            let bytes = self.load_raw(&hash)?;
            let node = TrieNode::decode(&hash, &bytes)?;
            nodes.push(bytes);

            let next = match node {
                TrieNode::Empty | TrieNode::Leaf { .. } => None,
                TrieNode::Extension { path: ext_path, child } => path
                    .strip_prefix(ext_path.as_slice())
                    .map(|rest| (rest, child)),
                TrieNode::Branch { children, .. } => path
                    .split_first()
                    .and_then(|(&i, rest)| children[i as usize].map(|child| (rest, child))),
            };
            match next {
                Some((rest, child)) => {
                    path = rest;
                    hash = child;
                }
                None => break,
            }
        }

        Ok(TrieProof { nodes })
    }

    /// Check that `proof` shows `key` maps to `value` (or is absent when
    /// `value` is `None`) under `expected_root`.
    pub fn verify_proof(
        key: &[u8],
        value: Option<&[u8]>,
        proof: &TrieProof,
        expected_root: &Hash,
    ) -> bool {
        if *expected_root == EMPTY_TRIE_ROOT {
            return value.is_none() && proof.is_empty();
        }

        let nibbles = Nibbles::from_bytes(key);
        let mut path = nibbles.as_slice();
        let mut expected_hash = *expected_root;
        let last = proof.nodes.len().saturating_sub(1);

        for (i, bytes) in proof.nodes.iter().enumerate() {
            if keccak256(bytes) != expected_hash {
                return false;
            }
            let Ok(node) = TrieNode::decode(&expected_hash, bytes) else {
                return false;
            };

            let found: Option<Option<&[u8]>> = match &node {
                TrieNode::Empty => Some(None),
                TrieNode::Leaf { path: leaf_path, value: leaf_value } => {
                    Some((leaf_path.as_slice() == path).then_some(leaf_value.as_slice()))
                }
                TrieNode::Extension { path: ext_path, child } => {
                    match path.strip_prefix(ext_path.as_slice()) {
                        Some(rest) => {
                            path = rest;
                            expected_hash = *child;
                            None
                        }
                        None => Some(None),
                    }
                }
                TrieNode::Branch { children, value: branch_value } => match path.split_first() {
                    None => Some(branch_value.as_deref()),
                    Some((&index, rest)) => match children[index as usize] {
                        Some(child) => {
                            path = rest;
                            expected_hash = child;
                            None
                        }
                        None => Some(None),
                    },
                },
            };

            if let Some(found) = found {
                return i == last && found == value;
            }
        }

        false
    }

    /// Every `(key, value)` pair under `root`, ordered by key.
    pub fn entries(&self, root: &Hash) -> TrieResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = BTreeMap::new();
        self.collect(root, Nibbles::default(), &mut out)?;
        Ok(out.into_iter().map(|(k, v)| (k.to_bytes(), v)).collect())
    }

    /// Keys whose values differ between `from` and `to`, ordered by key.
    ///
    /// Subtrees with equal hashes are skipped without being loaded.
    pub fn diff(&self, from: &Hash, to: &Hash) -> TrieResult<Vec<TrieChange>> {
        let mut changes = BTreeMap::new();
        self.diff_at(*from, *to, Nibbles::default(), &mut changes)?;
        Ok(changes.into_values().collect())
    }

    // -------------------------------------------------------------------------
    // internals
    // -------------------------------------------------------------------------

    fn check_key(&self, key: &[u8]) -> TrieResult<()> {
        if key.len() > self.config.max_key_len {
            return Err(TrieError::KeyTooLong {
                len: key.len(),
                max: self.config.max_key_len,
            });
        }
        Ok(())
    }

    fn check_value(&self, value: &[u8]) -> TrieResult<()> {
        if value.is_empty() {
            return Err(TrieError::EmptyValue);
        }
        if value.len() > self.config.max_value_len {
            return Err(TrieError::ValueTooLarge {
                len: value.len(),
                max: self.config.max_value_len,
            });
        }
        Ok(())
    }

    fn load_raw(&self, hash: &Hash) -> TrieResult<Vec<u8>> {
        self.db
            .get_node(hash)?
            .ok_or(TrieError::MissingNode(*hash))
    }

    fn load(&self, hash: &Hash) -> TrieResult<TrieNode> {
        if *hash == EMPTY_TRIE_ROOT {
            return Ok(TrieNode::Empty);
        }
        let bytes = self.load_raw(hash)?;
        TrieNode::decode(hash, &bytes)
    }

    fn collect(
        &self,
        hash: &Hash,
        prefix: Nibbles,
        out: &mut BTreeMap<Nibbles, Vec<u8>>,
    ) -> TrieResult<()> {
        match self.load(hash)? {
            TrieNode::Empty => {}
            TrieNode::Leaf { path, value } => {
                out.insert(prefix.join(path.as_slice()), value);
            }
            TrieNode::Extension { path, child } => {
                self.collect(&child, prefix.join(path.as_slice()), out)?;
            }
            TrieNode::Branch { children, value } => {
                if let Some(value) = value {
                    out.insert(prefix.clone(), value);
                }
                for (i, child) in children.iter().enumerate() {
                    if let Some(child) = child {
                        self.collect(child, prefix.join(&[i as u8]), out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn diff_at(
        &self,
        from: Hash,
        to: Hash,
        prefix: Nibbles,
        changes: &mut BTreeMap<Nibbles, TrieChange>,
    ) -> TrieResult<()> {
        if from == to {
            return Ok(());
        }

        match (self.load(&from)?, self.load(&to)?) {
            (
                TrieNode::Branch { children: a, value: va },
                TrieNode::Branch { children: b, value: vb },
            ) => {
                if va != vb {
                    record(changes, prefix.clone(), va, vb);
                }
                for i in 0..16 {
                    let child_prefix = prefix.join(&[i as u8]);
                    let left = a[i].unwrap_or(EMPTY_TRIE_ROOT);
                    let right = b[i].unwrap_or(EMPTY_TRIE_ROOT);
                    self.diff_at(left, right, child_prefix, changes)?;
                }
            }
            (
                TrieNode::Extension { path: pa, child: ca },
                TrieNode::Extension { path: pb, child: cb },
            ) if pa == pb => {
                self.diff_at(ca, cb, prefix.join(pa.as_slice()), changes)?;
            }
            _ => {
                let mut left = BTreeMap::new();
                let mut right = BTreeMap::new();
                self.collect(&from, prefix.clone(), &mut left)?;
                self.collect(&to, prefix, &mut right)?;

                for (key, old) in &left {
                    let new = right.get(key);
                    if new != Some(old) {
                        record(changes, key.clone(), Some(old.clone()), new.cloned());
                    }
                }
                for (key, new) in right {
                    if !left.contains_key(&key) {
                        record(changes, key, None, Some(new));
                    }
                }
            }
        }
        Ok(())
    }
}

fn record(
    changes: &mut BTreeMap<Nibbles, TrieChange>,
    key: Nibbles,
    old: Option<Vec<u8>>,
    new: Option<Vec<u8>>,
) {
    let bytes = key.to_bytes();
    changes.insert(
        key,
        TrieChange {
            key: bytes,
            old,
            new,
        },
    );
}

// =============================================================================
// WRITE SESSION
// =============================================================================

/// Nodes created by one update, held back until the update succeeds.
struct WriteSession<'a> {
    trie: &'a PatriciaMerkleTrie,
    pending: HashMap<Hash, TrieNode>,
}

impl<'a> WriteSession<'a> {
    fn new(trie: &'a PatriciaMerkleTrie) -> Self {
        Self {
            trie,
            pending: HashMap::new(),
        }
    }

    fn load(&self, hash: &Hash) -> TrieResult<TrieNode> {
        match self.pending.get(hash) {
            Some(node) => Ok(node.clone()),
            None => self.trie.load(hash),
        }
    }

    /// Hash a node and stage it. Empty nodes are never stored.
    fn store(&mut self, node: TrieNode) -> Option<Hash> {
        if matches!(node, TrieNode::Empty) {
            return None;
        }
        let hash = node.hash();
        self.pending.insert(hash, node);
        Some(hash)
    }

    fn commit(mut self, root: TrieNode) -> TrieResult<Hash> {
        let root_hash = self.store(root).unwrap_or(EMPTY_TRIE_ROOT);
        let batch: Vec<_> = self
            .pending
            .into_iter()
            .map(|(hash, node)| (hash, node.encode()))
            .collect();
        self.trie.db.batch_put(batch)?;
        Ok(root_hash)
    }

    fn insert(&mut self, node: TrieNode, path: &[u8], value: Vec<u8>) -> TrieResult<TrieNode> {
        match node {
            TrieNode::Empty => Ok(TrieNode::Leaf {
                path: Nibbles::from_slice(path),
                value,
            }),

            TrieNode::Leaf {
                path: leaf_path,
                value: leaf_value,
            } => {
                if leaf_path.as_slice() == path {
                    return Ok(TrieNode::Leaf {
                        path: leaf_path,
                        value,
                    });
                }
                let common = common_prefix_len(leaf_path.as_slice(), path);
                let mut branch = TrieNode::empty_branch();
                self.attach_leaf(&mut branch, &leaf_path.as_slice()[common..], leaf_value);
                self.attach_leaf(&mut branch, &path[common..], value);
                Ok(self.wrap(&path[..common], branch))
            }

            TrieNode::Extension {
                path: ext_path,
                child,
            } => {
                let common = common_prefix_len(ext_path.as_slice(), path);
                if common == ext_path.len() {
                    let child_node = self.load(&child)?;
                    let new_child = self.insert(child_node, &path[common..], value)?;
                    let child = self.store(new_child).ok_or(TrieError::CorruptNode {
                        hash: child,
                        reason: "extension child collapsed on insert".into(),
                    })?;
                    return Ok(TrieNode::Extension {
                        path: ext_path,
                        child,
                    });
                }

                let mut branch = TrieNode::empty_branch();
                let ext_rest = &ext_path.as_slice()[common + 1..];
                let ext_child = if ext_rest.is_empty() {
                    Some(child)
                } else {
                    self.store(TrieNode::Extension {
                        path: Nibbles::from_slice(ext_rest),
                        child,
                    })
                };
                if let TrieNode::Branch { children, .. } = &mut branch {
                    children[ext_path.as_slice()[common] as usize] = ext_child;
                }
                self.attach_leaf(&mut branch, &path[common..], value);
                Ok(self.wrap(&path[..common], branch))
            }

            TrieNode::Branch {
                mut children,
                value: branch_value,
            } => match path.split_first() {
                None => Ok(TrieNode::Branch {
                    children,
                    value: Some(value),
                }),
                Some((&index, rest)) => {
                    let child = match children[index as usize] {
                        Some(hash) => self.load(&hash)?,
                        None => TrieNode::Empty,
                    };
                    let new_child = self.insert(child, rest, value)?;
                    children[index as usize] = self.store(new_child);
                    Ok(TrieNode::Branch {
                        children,
                        value: branch_value,
                    })
                }
            },
        }
    }

    /// Place a value into a fresh branch: at the branch itself when the
    /// remaining path is empty, otherwise as a leaf under the first nibble.
    fn attach_leaf(&mut self, branch: &mut TrieNode, path: &[u8], value: Vec<u8>) {
        match path.split_first() {
            Some((&index, rest)) => {
                let leaf = self.store(TrieNode::Leaf {
                    path: Nibbles::from_slice(rest),
                    value,
                });
                if let TrieNode::Branch { children, .. } = branch {
                    children[index as usize] = leaf;
                }
            }
            None => {
                if let TrieNode::Branch { value: slot, .. } = branch {
                    *slot = Some(value);
                }
            }
        }
    }

    /// Prefix `node` with an extension when `prefix` is non-empty.
    fn wrap(&mut self, prefix: &[u8], node: TrieNode) -> TrieNode {
        if prefix.is_empty() {
            return node;
        }
        match self.store(node) {
            Some(child) => TrieNode::Extension {
                path: Nibbles::from_slice(prefix),
                child,
            },
            None => TrieNode::Empty,
        }
    }

    fn remove(&mut self, node: TrieNode, path: &[u8]) -> TrieResult<TrieNode> {
        match node {
            TrieNode::Empty => Ok(TrieNode::Empty),

            TrieNode::Leaf {
                path: leaf_path,
                value,
            } => {
                if leaf_path.as_slice() == path {
                    Ok(TrieNode::Empty)
                } else {
                    Ok(TrieNode::Leaf {
                        path: leaf_path,
                        value,
                    })
                }
            }

            TrieNode::Extension {
                path: ext_path,
                child,
            } => {
                let Some(rest) = path.strip_prefix(ext_path.as_slice()) else {
                    return Ok(TrieNode::Extension {
                        path: ext_path,
                        child,
                    });
                };
                let child_node = self.load(&child)?;
                let new_child = self.remove(child_node, rest)?;
                Ok(self.merge_extension(ext_path, new_child))
            }

            TrieNode::Branch {
                mut children,
                value,
            } => {
                let value = match path.split_first() {
                    None => None,
                    Some((&index, rest)) => {
                        let Some(child) = children[index as usize] else {
                            return Ok(TrieNode::Branch { children, value });
                        };
                        let child_node = self.load(&child)?;
                        let new_child = self.remove(child_node, rest)?;
                        children[index as usize] = self.store(new_child);
                        value
                    }
                };
                self.normalize_branch(children, value)
            }
        }
    }

    /// Fold an extension into a child that is no longer a branch.
    fn merge_extension(&mut self, prefix: Nibbles, child: TrieNode) -> TrieNode {
        match child {
            TrieNode::Empty => TrieNode::Empty,
            TrieNode::Leaf { path, value } => TrieNode::Leaf {
                path: prefix.join(path.as_slice()),
                value,
            },
            TrieNode::Extension { path, child } => TrieNode::Extension {
                path: prefix.join(path.as_slice()),
                child,
            },
            branch @ TrieNode::Branch { .. } => match self.store(branch) {
                Some(child) => TrieNode::Extension {
                    path: prefix,
                    child,
                },
                None => TrieNode::Empty,
            },
        }
    }

    /// Collapse a branch left with fewer than two entries.
    fn normalize_branch(
        &mut self,
        children: Box<[Option<Hash>; 16]>,
        value: Option<Vec<u8>>,
    ) -> TrieResult<TrieNode> {
        let occupied: Vec<usize> = (0..16).filter(|&i| children[i].is_some()).collect();

        match (occupied.as_slice(), value) {
            ([], None) => Ok(TrieNode::Empty),
            ([], Some(value)) => Ok(TrieNode::Leaf {
                path: Nibbles::default(),
                value,
            }),
            ([index], None) => {
                let hash = children[*index].unwrap_or(EMPTY_TRIE_ROOT);
                let child = self.load(&hash)?;
                Ok(self.merge_extension(Nibbles::from_slice(&[*index as u8]), child))
            }
            (_, value) => Ok(TrieNode::Branch { children, value }),
        }
    }
}
