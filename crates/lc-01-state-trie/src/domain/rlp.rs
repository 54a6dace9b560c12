//! Minimal RLP codec for trie nodes.
//!
//! Trie nodes are lists of byte strings only (child references are hashes,
//! never inline nodes), so nested lists are not supported.

// =============================================================================
// ENCODING
// =============================================================================

/// RLP-encode a byte slice.
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        vec![data[0]]
    } else {
        let mut result = encode_header(0x80, data.len());
        result.extend_from_slice(data);
        result
    }
}

/// RLP-encode a list of byte strings.
pub fn encode_list(items: &[&[u8]]) -> Vec<u8> {
    let payload: Vec<u8> = items.iter().flat_map(|item| encode_bytes(item)).collect();
    let mut result = encode_header(0xc0, payload.len());
    result.extend(payload);
    result
}

fn encode_header(offset: u8, len: usize) -> Vec<u8> {
    if len < 56 {
        vec![offset + len as u8]
    } else {
        let len_bytes = encode_length(len);
        let mut header = Vec::with_capacity(len_bytes.len() + 1);
        header.push(offset + 55 + len_bytes.len() as u8);
        header.extend_from_slice(&len_bytes);
        header
    }
}

/// Encode a length as minimal big-endian bytes.
fn encode_length(len: usize) -> Vec<u8> {
    let bytes = len.to_be_bytes();
    let start = bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len() - 1);
    bytes[start..].to_vec()
}

// =============================================================================
// DECODING
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpError {
    Truncated,
    TrailingBytes,
    NonCanonical,
    ExpectedList,
    UnexpectedList,
}

struct Header {
    is_list: bool,
    header_len: usize,
    payload_len: usize,
}

fn decode_header(data: &[u8]) -> Result<Header, RlpError> {
    let first = *data.first().ok_or(RlpError::Truncated)?;
    let header = match first {
        0x00..=0x7f => Header {
            is_list: false,
            header_len: 0,
            payload_len: 1,
        },
        0x80..=0xb7 => {
            let len = (first - 0x80) as usize;
            if len == 1 && data.get(1).map_or(false, |b| *b < 0x80) {
                return Err(RlpError::NonCanonical);
            }
            Header {
                is_list: false,
                header_len: 1,
                payload_len: len,
            }
        }
        0xb8..=0xbf => long_header(data, (first - 0xb7) as usize, false)?,
        0xc0..=0xf7 => Header {
            is_list: true,
            header_len: 1,
            payload_len: (first - 0xc0) as usize,
        },
        0xf8..=0xff => long_header(data, (first - 0xf7) as usize, true)?,
    };

    if data.len() < header.header_len + header.payload_len {
        return Err(RlpError::Truncated);
    }
    Ok(header)
}

fn long_header(data: &[u8], len_of_len: usize, is_list: bool) -> Result<Header, RlpError> {
    let len_bytes = data.get(1..1 + len_of_len).ok_or(RlpError::Truncated)?;
    if len_bytes[0] == 0 || len_of_len > std::mem::size_of::<usize>() {
        return Err(RlpError::NonCanonical);
    }
    let payload_len = len_bytes
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | *b as usize);
    if payload_len < 56 {
        return Err(RlpError::NonCanonical);
    }
    Ok(Header {
        is_list,
        header_len: 1 + len_of_len,
        payload_len,
    })
}

/// Decode a list of byte strings; the list must span all of `data`.
pub fn decode_list(data: &[u8]) -> Result<Vec<Vec<u8>>, RlpError> {
    let header = decode_header(data)?;
    if !header.is_list {
        return Err(RlpError::ExpectedList);
    }
    if header.header_len + header.payload_len != data.len() {
        return Err(RlpError::TrailingBytes);
    }

    let mut payload = &data[header.header_len..];
    let mut items = Vec::new();
    while !payload.is_empty() {
        let item = decode_header(payload)?;
        if item.is_list {
            return Err(RlpError::UnexpectedList);
        }
        let end = item.header_len + item.payload_len;
        items.push(payload[item.header_len..end].to_vec());
        payload = &payload[end..];
    }
    Ok(items)
}
