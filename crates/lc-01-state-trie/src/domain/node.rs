use super::errors::{TrieError, TrieResult};
use super::nibbles::Nibbles;
use super::rlp;
use shared_crypto::keccak256;
use shared_types::{Hash, EMPTY_TRIE_ROOT};

// =============================================================================
// TRIE NODE: The four node types in MPT
// =============================================================================

/// Node types in the Patricia Merkle Trie.
///
/// Every child is referenced by the hash of its encoding; nodes are never
/// inlined. A node is immutable once hashed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrieNode {
    /// Empty node (null reference, hash = EMPTY_TRIE_ROOT). Never stored.
    Empty,

    /// Leaf node: remaining key path and the value.
    /// RLP: [hex_prefix(path, true), value]
    Leaf { path: Nibbles, value: Vec<u8> },

    /// Extension node: shared prefix with a single (branch) child.
    /// RLP: [hex_prefix(path, false), child_hash]
    Extension { path: Nibbles, child: Hash },

    /// Branch node: 16-way branch for each nibble value.
    /// RLP: \[child\[0\], ..., child\[15\], value\]
    Branch {
        children: Box<[Option<Hash>; 16]>,
        value: Option<Vec<u8>>,
    },
}

impl TrieNode {
    pub fn empty_branch() -> Self {
        TrieNode::Branch {
            children: Box::new([None; 16]),
            value: None,
        }
    }

    /// Canonical RLP encoding; the node's identity.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            TrieNode::Empty => rlp::encode_bytes(&[]),

            TrieNode::Leaf { path, value } => {
                let encoded_path = path.encode_hex_prefix(true);
                rlp::encode_list(&[&encoded_path, value])
            }

            TrieNode::Extension { path, child } => {
                let encoded_path = path.encode_hex_prefix(false);
                rlp::encode_list(&[&encoded_path, child])
            }

            TrieNode::Branch { children, value } => {
                let mut items: Vec<&[u8]> = Vec::with_capacity(17);
                for child in children.iter() {
                    items.push(child.as_ref().map_or(&[][..], |h| &h[..]));
                }
                items.push(value.as_deref().unwrap_or(&[]));
                rlp::encode_list(&items)
            }
        }
    }

    /// Keccak-256 of the encoding.
    pub fn hash(&self) -> Hash {
        if matches!(self, TrieNode::Empty) {
            return EMPTY_TRIE_ROOT;
        }
        keccak256(&self.encode())
    }

    /// Decode a node read from the store or carried in a proof.
    pub fn decode(hash: &Hash, bytes: &[u8]) -> TrieResult<Self> {
        let corrupt = |reason: &str| TrieError::CorruptNode {
            hash: *hash,
            reason: reason.to_string(),
        };

        if bytes == [0x80] {
            return Ok(TrieNode::Empty);
        }

        let items = rlp::decode_list(bytes).map_err(|e| corrupt(&format!("{e:?}")))?;
        match items.len() {
            2 => {
                let (path, is_leaf) = Nibbles::decode_hex_prefix(&items[0])
                    .ok_or_else(|| corrupt("bad hex-prefix path"))?;
                if is_leaf {
                    if items[1].is_empty() {
                        return Err(corrupt("leaf without value"));
                    }
                    Ok(TrieNode::Leaf {
                        path,
                        value: items[1].clone(),
                    })
                } else {
                    if path.is_empty() {
                        return Err(corrupt("extension with empty path"));
                    }
                    Ok(TrieNode::Extension {
                        path,
                        child: to_hash(&items[1]).ok_or_else(|| corrupt("bad child hash"))?,
                    })
                }
            }
            17 => {
                let mut children = [None; 16];
                for (slot, item) in children.iter_mut().zip(items.iter()) {
                    if !item.is_empty() {
                        *slot = Some(to_hash(item).ok_or_else(|| corrupt("bad child hash"))?);
                    }
                }
                let value = (!items[16].is_empty()).then(|| items[16].clone());
                Ok(TrieNode::Branch {
                    children: Box::new(children),
                    value,
                })
            }
            n => Err(corrupt(&format!("unexpected item count {n}"))),
        }
    }
}

fn to_hash(bytes: &[u8]) -> Option<Hash> {
    bytes.try_into().ok()
}
