//! A static, read-optimized trie for ranked prefix completion.
//!
//! This crate provides [`RankedTrie`], a byte-packed trie built once from a
//! lexicographically sorted list of (suggestion, score) pairs. Queries return
//! completions of a prefix in order of decreasing score, operating directly on
//! the packed byte encoding. Tries serialize to a compact container file and
//! load back without any re-encoding.
//!
//! # Quick start
//!
//! ```
//! use ranked_trie::RankedTrie;
//!
//! let trie = RankedTrie::from_entries(&[
//!     ("bat", 3u64),
//!     ("batch", 7),
//!     ("bath", 5),
//! ])
//! .unwrap();
//!
//! let texts: Vec<String> = trie.complete("bat").map(|c| c.text).collect();
//! assert_eq!(texts, ["batch", "bath", "bat"]);
//! assert_eq!(trie.score("bath").unwrap(), 5);
//! ```

#![warn(missing_docs)]

mod build;
mod codec;
mod node;
mod search;
mod store;
mod trie;
mod varint;
mod view;

#[cfg(test)]
mod proptests;

pub use codec::{Codec, Unit};
pub use trie::{Completion, Completions, RankedTrie};

/// A specialized result type whose error defaults to [`TrieError`].
pub type Result<T, E = TrieError> = std::result::Result<T, E>;

/// Errors that can occur while building, loading, or querying a trie.
#[derive(Debug, thiserror::Error)]
pub enum TrieError {
    /// Suggestions were not in strictly increasing lexicographic order.
    #[error("suggestions must be sorted in ascending order with no duplicates")]
    UnsortedInput,

    /// Suggestion and score slices have different lengths.
    #[error("suggestion and score ranges have different lengths")]
    LengthMismatch,

    /// A node label exceeded the 7-byte limit imposed by the header layout.
    #[error("node label exceeds the maximum encodable length")]
    LabelTooLong,

    /// Sibling ranks were not in non-decreasing order during encoding.
    #[error("sibling ranks not in non-decreasing order")]
    RankOrder,

    /// The file does not start with the expected magic bytes and score type id.
    #[error("invalid magic bytes or mismatched score type")]
    InvalidMagic,

    /// The file was written by an incompatible release.
    #[error("unsupported major version {0}")]
    InvalidVersion(u32),

    /// The file was written on a platform with different endianness.
    #[error("file endianness does not match this platform")]
    EndianMismatch,

    /// The file is shorter than its header claims.
    #[error("truncated or corrupted data")]
    TruncatedData,

    /// The queried suggestion is not stored in the trie.
    #[error("suggestion not found")]
    NotFound,

    /// An underlying I/O operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
