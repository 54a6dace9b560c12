pub mod errors;
pub mod nibbles;
pub mod node;
pub mod rlp;
pub mod state;
pub mod trie;

pub use errors::*;
pub use nibbles::Nibbles;
pub use node::TrieNode;
pub use state::*;
pub use trie::*;
