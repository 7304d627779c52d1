//! Byte-level node encoding.
//!
//! A node is a variable-length byte sequence:
//!
//! ```text
//! header | offset varint | label bytes | rank varint | payload (leaf only)
//! ```
//!
//! The header byte packs the sizes of the variable parts plus the leaf flag:
//! bits 0–2 hold the label length (0–7), bit 3 the leaf flag, bits 4–5 the
//! offset codeword tag, bits 6–7 the rank codeword tag.

use crate::codec::Codec;
use crate::varint::{OffsetVarint, RankVarint, WordSize};
use crate::{Result, TrieError};

const LABEL_MASK: u8 = 0b0000_0111;
const LEAF_BIT: u8 = 1 << 3;
const OFFSET_SHIFT: u8 = 4;
const RANK_SHIFT: u8 = 6;

/// Labels longer than this do not fit the 3-bit length field.
pub(crate) const MAX_LABEL_LEN: usize = 7;

/// The one-byte encoding of an empty trie: a leaf with no label, no offset,
/// and rank zero. The synthetic root of a non-empty trie is the same byte
/// with the leaf flag cleared.
pub(crate) const SENTINEL_LEAF: u8 = LEAF_BIT;

/// Decoded view of a node's header byte.
#[derive(Clone, Copy)]
pub(crate) struct NodeHeader(pub(crate) u8);

impl NodeHeader {
    #[inline]
    pub(crate) fn label_len(self) -> usize {
        (self.0 & LABEL_MASK) as usize
    }

    #[inline]
    pub(crate) fn is_leaf(self) -> bool {
        self.0 & LEAF_BIT != 0
    }

    #[inline]
    pub(crate) fn offset_tag(self) -> WordSize {
        WordSize::from_bits(self.0 >> OFFSET_SHIFT)
    }

    #[inline]
    pub(crate) fn rank_tag(self) -> WordSize {
        WordSize::from_bits(self.0 >> RANK_SHIFT)
    }
}

/// Upper bound on the encoded size of a single node with payload type `M`.
pub(crate) fn max_encoded_size<M: Codec>() -> usize {
    1 + OffsetVarint::MAX_CODEWORD_SIZE
        + MAX_LABEL_LEN
        + RankVarint::MAX_CODEWORD_SIZE
        + M::MAX_ENCODED_SIZE
}

/// Appends one encoded node to `out`.
///
/// `rank` is the delta from the previous sibling (or the group base for the
/// first sibling), `children_offset` the distance covered by this node's
/// offset field. `payload` is `Some` exactly for leaves. The header byte is
/// backpatched once both varint tags are known.
pub(crate) fn encode_node<M: Codec>(
    out: &mut Vec<u8>,
    label: &[u8],
    rank: u64,
    children_offset: u64,
    payload: Option<M>,
) -> Result<()> {
    if label.len() > MAX_LABEL_LEN {
        return Err(TrieError::LabelTooLong);
    }

    out.reserve(max_encoded_size::<M>());
    let header_pos = out.len();
    out.push(0);

    let offset_tag = OffsetVarint::encode(out, children_offset);
    out.extend_from_slice(label);
    let rank_tag = RankVarint::encode(out, rank);

    let is_leaf = payload.is_some();
    if let Some(value) = payload {
        M::encode(out, value);
    }

    out[header_pos] = label.len() as u8
        | if is_leaf { LEAF_BIT } else { 0 }
        | (offset_tag.bits() << OFFSET_SHIFT)
        | (rank_tag.bits() << RANK_SHIFT);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Unit;

    #[test]
    fn internal_node_header_fields() {
        let mut buf = Vec::new();
        encode_node::<Unit>(&mut buf, b"label", 10, 20, None).unwrap();

        let header = NodeHeader(buf[0]);
        assert!(!header.is_leaf());
        assert_eq!(header.label_len(), 5);
        assert_eq!(header.offset_tag(), WordSize::U8);
        assert_eq!(header.rank_tag(), WordSize::U8);
        // header + offset byte + 5 label bytes + rank byte
        assert_eq!(buf.len(), 8);
        assert_eq!(&buf[2..7], b"label");
    }

    #[test]
    fn leaf_node_sets_flag() {
        let mut buf = Vec::new();
        encode_node::<Unit>(&mut buf, b"label", 10, 20, Some(Unit)).unwrap();
        assert!(NodeHeader(buf[0]).is_leaf());
    }

    #[test]
    fn leaf_payload_bytes_trail_the_rank() {
        let mut buf = Vec::new();
        encode_node::<u32>(&mut buf, b"ab", 1, 0, Some(0xDEAD_BEEF)).unwrap();

        let header = NodeHeader(buf[0]);
        assert!(header.is_leaf());
        assert_eq!(header.offset_tag(), WordSize::Empty);
        // header + 2 label bytes + 1 rank byte, then the payload
        assert_eq!(buf.len(), 4 + 4);
        assert_eq!(u32::decode(&buf[4..]), 0xDEAD_BEEF);
    }

    #[test]
    fn zero_fields_collapse_to_one_byte() {
        let mut buf = Vec::new();
        encode_node::<Unit>(&mut buf, b"", 0, 0, None).unwrap();
        assert_eq!(buf, [0]);

        buf.clear();
        encode_node::<Unit>(&mut buf, b"", 0, 0, Some(Unit)).unwrap();
        assert_eq!(buf, [SENTINEL_LEAF]);
    }

    #[test]
    fn seven_byte_label_is_the_limit() {
        let mut buf = Vec::new();
        encode_node::<Unit>(&mut buf, b"aaaaaaa", 0, 0, None).unwrap();
        assert_eq!(NodeHeader(buf[0]).label_len(), 7);

        assert!(matches!(
            encode_node::<Unit>(&mut buf, b"aaaaaaaa", 0, 0, None),
            Err(TrieError::LabelTooLong)
        ));
    }

    #[test]
    fn wide_fields_use_wide_tags() {
        let mut buf = Vec::new();
        encode_node::<Unit>(&mut buf, b"x", u64::MAX, 0x1_0000, None).unwrap();
        let header = NodeHeader(buf[0]);
        assert_eq!(header.offset_tag(), WordSize::U64);
        assert_eq!(header.rank_tag(), WordSize::U64);
    }
}
