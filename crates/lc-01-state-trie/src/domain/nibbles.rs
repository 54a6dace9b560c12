// =============================================================================
// NIBBLES: Half-byte path representation
// =============================================================================

/// Nibble path for trie traversal.
///
/// Keys are split into half-bytes (0-15) for traversal through the trie.
/// A 20-byte address becomes 40 nibbles.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nibbles(pub Vec<u8>);

impl Nibbles {
    /// Create nibbles from arbitrary key bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut nibbles = Vec::with_capacity(bytes.len() * 2);
        for byte in bytes {
            nibbles.push(byte >> 4);
            nibbles.push(byte & 0x0F);
        }
        Nibbles(nibbles)
    }

    pub fn from_slice(nibbles: &[u8]) -> Self {
        Nibbles(nibbles.to_vec())
    }

    /// Pack back into bytes. Only meaningful for even-length paths.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0
            .chunks(2)
            .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
            .collect()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Path formed by `self` followed by `other`.
    pub fn join(&self, other: &[u8]) -> Self {
        let mut joined = Vec::with_capacity(self.len() + other.len());
        joined.extend_from_slice(&self.0);
        joined.extend_from_slice(other);
        Nibbles(joined)
    }

    /// Path with a single nibble prepended.
    pub fn prepend(&self, nibble: u8) -> Self {
        let mut out = Vec::with_capacity(self.len() + 1);
        out.push(nibble);
        out.extend_from_slice(&self.0);
        Nibbles(out)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode nibbles with hex-prefix.
    ///
    /// - First nibble encodes flags: 0=extension even, 1=extension odd, 2=leaf even, 3=leaf odd
    /// - If odd number of nibbles, first nibble is part of path
    pub fn encode_hex_prefix(&self, is_leaf: bool) -> Vec<u8> {
        let odd = self.len() % 2 == 1;
        let prefix = if is_leaf { 2 } else { 0 } + if odd { 1 } else { 0 };

        let mut result = Vec::with_capacity(self.len() / 2 + 1);

        let rest = if odd {
            result.push((prefix << 4) | self.0[0]);
            &self.0[1..]
        } else {
            result.push(prefix << 4);
            &self.0[..]
        };
        for chunk in rest.chunks(2) {
            result.push((chunk[0] << 4) | chunk[1]);
        }

        result
    }

    /// Decode hex-prefix bytes back to `(nibbles, is_leaf)`.
    ///
    /// Returns `None` for unknown flags or non-zero padding.
    pub fn decode_hex_prefix(encoded: &[u8]) -> Option<(Self, bool)> {
        let first = *encoded.first()?;
        let prefix = first >> 4;
        if prefix > 3 {
            return None;
        }
        let is_leaf = prefix >= 2;
        let odd = prefix % 2 == 1;

        let mut nibbles = Vec::with_capacity(encoded.len() * 2);
        if odd {
            nibbles.push(first & 0x0F);
        } else if first & 0x0F != 0 {
            return None;
        }

        for &byte in &encoded[1..] {
            nibbles.push(byte >> 4);
            nibbles.push(byte & 0x0F);
        }

        Some((Nibbles(nibbles), is_leaf))
    }
}

/// Length of the shared prefix of two nibble slices.
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
