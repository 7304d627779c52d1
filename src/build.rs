//! Bottom-up construction of the packed trie encoding.
//!
//! The builder ingests suggestions in increasing lexicographic order and
//! maintains a stack of open levels: level `k` holds the nodes attached to
//! the length-`k` prefix of the previously seen suggestion. Each new
//! suggestion merges the levels below the common prefix into their parents
//! and pushes fresh nodes for its remaining characters.

use std::cmp::Ordering;

use crate::codec::Codec;
use crate::node::{encode_node, max_encoded_size, MAX_LABEL_LEN, SENTINEL_LEAF};
use crate::{Result, TrieError};

/// A subtree under construction: its edge label, the minimum rank across its
/// leaves, the leaf payload (for leaves), and the already-encoded bytes of
/// its descendant sibling groups.
pub(crate) struct BuilderNode<M: Codec> {
    label: Vec<u8>,
    rank: u64,
    payload: Option<M>,
    subtree: Vec<u8>,
}

impl<M: Codec> BuilderNode<M> {
    /// A leaf carrying a rank and payload.
    pub(crate) fn leaf(label: &[u8], rank: u64, payload: M) -> Result<Self> {
        if label.len() > MAX_LABEL_LEN {
            return Err(TrieError::LabelTooLong);
        }
        Ok(BuilderNode {
            label: label.to_vec(),
            rank,
            payload: Some(payload),
            subtree: Vec::new(),
        })
    }

    /// An internal node; children are attached later.
    pub(crate) fn internal(label: &[u8]) -> Result<Self> {
        if label.len() > MAX_LABEL_LEN {
            return Err(TrieError::LabelTooLong);
        }
        Ok(BuilderNode {
            label: label.to_vec(),
            rank: 0,
            payload: None,
            subtree: Vec::new(),
        })
    }

    /// Attaches `children` as this node's sibling group.
    ///
    /// A sole child whose label concatenates with this node's within the
    /// 7-byte limit is collapsed into this node (inheriting its rank, leaf
    /// status, payload, and subtree) instead of being encoded as a group.
    pub(crate) fn add_children(&mut self, mut children: Vec<BuilderNode<M>>) -> Result<()> {
        debug_assert!(self.payload.is_none(), "cannot attach children to a leaf");

        if children.is_empty() {
            return Ok(());
        }

        if children.len() == 1 && self.label.len() + children[0].label.len() <= MAX_LABEL_LEN {
            let child = children.remove(0);
            self.label.extend_from_slice(&child.label);
            self.rank = child.rank;
            self.payload = child.payload;
            self.subtree = child.subtree;
            return Ok(());
        }

        children.sort_by_key(|child| child.rank);
        self.rank = children[0].rank;
        let base_rank = self.rank;
        encode_siblings(&mut self.subtree, children, base_rank)
    }
}

/// Encodes one sibling group followed by all sibling subtrees.
///
/// `siblings` must already be sorted by rank; `base_rank` is the group's
/// minimum (the parent's rank, or zero at the root). Each sibling's rank is
/// stored as the delta from its predecessor.
///
/// The first sibling's offset field must cover the other siblings' header
/// blocks, whose total size is only known after they are emitted. So
/// siblings 2..N are encoded first, the first sibling last, and its bytes
/// are rotated to the front of the group.
pub(crate) fn encode_siblings<M: Codec>(
    out: &mut Vec<u8>,
    mut siblings: Vec<BuilderNode<M>>,
    base_rank: u64,
) -> Result<()> {
    debug_assert!(!siblings.is_empty());

    let estimated = siblings.len() * max_encoded_size::<M>()
        + siblings.iter().map(|node| node.subtree.len()).sum::<usize>();
    let initial_len = out.len();
    out.reserve(estimated);

    // Siblings 2..N: each offset field covers the previous sibling's subtree.
    let mut prev_rank = siblings[0].rank;
    let mut prev_subtree_len = siblings[0].subtree.len();
    for node in &siblings[1..] {
        if node.rank < prev_rank {
            return Err(TrieError::RankOrder);
        }
        encode_node(
            out,
            &node.label,
            node.rank - prev_rank,
            prev_subtree_len as u64,
            node.payload,
        )?;
        prev_rank = node.rank;
        prev_subtree_len = node.subtree.len();
    }

    let later_headers_len = out.len() - initial_len;
    let first = &siblings[0];
    if first.rank < base_rank {
        return Err(TrieError::RankOrder);
    }
    encode_node(
        out,
        &first.label,
        first.rank - base_rank,
        later_headers_len as u64,
        first.payload,
    )?;
    out[initial_len..].rotate_left(later_headers_len);

    // All subtrees follow the complete header block, in sibling order.
    for node in &mut siblings {
        out.append(&mut node.subtree);
    }
    Ok(())
}

/// Builds the packed trie from parallel suggestion, rank, and payload
/// columns. Suggestions must be in strictly increasing lexicographic order.
pub(crate) fn encode_trie<T, M>(suggestions: &[T], ranks: &[u64], payloads: &[M]) -> Result<Vec<u8>>
where
    T: AsRef<[u8]>,
    M: Codec,
{
    if suggestions.len() != ranks.len() || suggestions.len() != payloads.len() {
        return Err(TrieError::LengthMismatch);
    }
    if suggestions.is_empty() {
        return Ok(vec![SENTINEL_LEAF]);
    }

    let mut levels: Vec<Vec<BuilderNode<M>>> = Vec::new();

    for (i, text) in suggestions.iter().enumerate() {
        let text = text.as_ref();
        let mut lcp = 0;
        if i > 0 {
            let prev = suggestions[i - 1].as_ref();
            if text <= prev {
                return Err(TrieError::UnsortedInput);
            }
            lcp = text
                .iter()
                .zip(prev)
                .take_while(|(a, b)| a == b)
                .count();
            merge_levels(&mut levels, lcp + 1)?;
        }

        levels.resize_with(text.len() + 1, Vec::new);
        for idx in lcp..text.len() {
            levels[idx].push(BuilderNode::internal(&text[idx..idx + 1])?);
        }
        levels[text.len()].push(BuilderNode::leaf(b"", ranks[i], payloads[i])?);
    }

    merge_levels(&mut levels, 1)?;
    finish_root(levels.pop().unwrap_or_default())
}

/// Merges open levels bottom-up until only `target_depth` remain.
fn merge_levels<M: Codec>(levels: &mut Vec<Vec<BuilderNode<M>>>, target_depth: usize) -> Result<()> {
    debug_assert!(target_depth >= 1);
    while levels.len() > target_depth {
        // Every open level is non-empty: each is pushed to as soon as it is
        // created, so both unwraps hold by construction.
        let children = levels.pop().unwrap();
        let parent = levels.last_mut().and_then(|level| level.last_mut()).unwrap();
        parent.add_children(children)?;
    }
    Ok(())
}

/// Prepends the synthetic root byte and encodes the top-level sibling group.
fn finish_root<M: Codec>(mut children: Vec<BuilderNode<M>>) -> Result<Vec<u8>> {
    if children.is_empty() {
        return Ok(vec![SENTINEL_LEAF]);
    }
    // The synthetic root: a zero header byte whose children group follows it.
    let mut out = vec![0u8];
    children.sort_by_key(|child| child.rank);
    encode_siblings(&mut out, children, 0)?;
    Ok(out)
}

/// Encodes the deduplicated, comparator-sorted score table and maps each
/// input score to its byte offset into the table.
///
/// The comparator orders best scores first, so the best score lands at
/// offset zero and lower offsets always mean higher priority.
///
/// # Panics
///
/// If `cmp` is not a total order over the input scores.
pub(crate) fn encode_scores<S, F>(scores: &[S], cmp: &F) -> (Vec<u8>, Vec<u64>)
where
    S: Codec,
    F: Fn(&S, &S) -> Ordering,
{
    let mut unique = scores.to_vec();
    unique.sort_by(|a, b| cmp(a, b));
    unique.dedup_by(|a, b| cmp(a, b) == Ordering::Equal);

    let mut table = Vec::with_capacity(unique.len() * S::MAX_ENCODED_SIZE);
    let mut offsets = Vec::with_capacity(unique.len());
    for &score in &unique {
        offsets.push(table.len() as u64);
        S::encode(&mut table, score);
    }

    let ranks = scores
        .iter()
        .map(|score| {
            let idx = unique
                .binary_search_by(|probe| cmp(probe, score))
                .expect("score comparator must induce a total order");
            offsets[idx]
        })
        .collect();

    (table, ranks)
}
