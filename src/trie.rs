//! The public trie facade.

use std::cmp::Ordering;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use crate::build::{encode_scores, encode_trie};
use crate::codec::{Codec, Unit};
use crate::node::SENTINEL_LEAF;
use crate::search::{descend_path, find_leaf, prefix_match, OrderedLeaves, SiblingCursor};
use crate::store::Store;
use crate::view::NodeView;
use crate::{Result, TrieError};

/// A suggestion paired with its score.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion<S> {
    /// The suggestion text.
    pub text: String,
    /// The score stored with the suggestion.
    pub score: S,
}

impl<S> From<(String, S)> for Completion<S> {
    fn from((text, score): (String, S)) -> Self {
        Completion { text, score }
    }
}

impl<S> From<Completion<S>> for (String, S) {
    fn from(completion: Completion<S>) -> Self {
        (completion.text, completion.score)
    }
}

/// A static trie answering ranked prefix-completion queries.
///
/// Built once from suggestions in increasing lexicographic order, then
/// queried over the packed byte encoding without further allocation beyond
/// the traversal frontier. All queries are read-only; a trie can be shared
/// freely across threads.
///
/// Scores live in a deduplicated table sorted by the construction-time
/// comparator, best first; each leaf stores its table offset, so lower
/// offsets always rank earlier.
pub struct RankedTrie<S: Codec> {
    store: Arc<Store>,
    _score: PhantomData<S>,
}

impl<S: Codec> Clone for RankedTrie<S> {
    fn clone(&self) -> Self {
        RankedTrie {
            store: Arc::clone(&self.store),
            _score: PhantomData,
        }
    }
}

impl<S: Codec> Default for RankedTrie<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Codec + Ord> RankedTrie<S> {
    /// Builds a trie from `(text, score)` entries sorted by text in strictly
    /// increasing order, ranking greater scores first.
    pub fn from_entries<T: AsRef<str>>(entries: &[(T, S)]) -> Result<Self> {
        Self::from_entries_by(entries, |a, b| b.cmp(a))
    }

    /// Builds a trie from parallel suggestion and score columns, ranking
    /// greater scores first.
    pub fn from_scored<T: AsRef<str>>(suggestions: &[T], scores: &[S]) -> Result<Self> {
        if suggestions.len() != scores.len() {
            return Err(TrieError::LengthMismatch);
        }
        Self::build(suggestions, scores, |a, b| b.cmp(a))
    }
}

impl<S: Codec> RankedTrie<S> {
    /// An empty trie: no suggestions, every query comes back empty.
    pub fn new() -> Self {
        RankedTrie {
            store: Arc::new(Store::from_parts(vec![SENTINEL_LEAF], Vec::new())),
            _score: PhantomData,
        }
    }

    /// Builds a trie with an explicit score order: `cmp` must order better
    /// scores first. This is the entry point for score types without a total
    /// order of their own, such as `f64`.
    ///
    /// # Panics
    ///
    /// If `cmp` does not induce a total order over the given scores.
    pub fn from_entries_by<T, F>(entries: &[(T, S)], cmp: F) -> Result<Self>
    where
        T: AsRef<str>,
        F: Fn(&S, &S) -> Ordering,
    {
        let texts: Vec<&str> = entries.iter().map(|(text, _)| text.as_ref()).collect();
        let scores: Vec<S> = entries.iter().map(|(_, score)| *score).collect();
        Self::build(&texts, &scores, cmp)
    }

    fn build<T, F>(texts: &[T], scores: &[S], cmp: F) -> Result<Self>
    where
        T: AsRef<str>,
        F: Fn(&S, &S) -> Ordering,
    {
        if texts.len() != scores.len() {
            return Err(TrieError::LengthMismatch);
        }
        let (table, ranks) = encode_scores(scores, &cmp);
        let texts: Vec<&[u8]> = texts.iter().map(|text| text.as_ref().as_bytes()).collect();
        let payloads = vec![Unit; ranks.len()];
        let trie = encode_trie(&texts, &ranks, &payloads)?;
        Ok(RankedTrie {
            store: Arc::new(Store::from_parts(trie, table)),
            _score: PhantomData,
        })
    }

    /// Loads a trie previously saved with [`RankedTrie::write`].
    ///
    /// The file must have been written for the same score type, on a
    /// platform of the same endianness, by a release with the same major
    /// format version.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Store::read(path.as_ref(), S::format_id())?;
        Ok(RankedTrie {
            store: Arc::new(store),
            _score: PhantomData,
        })
    }

    /// Writes the trie to `path`.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.store.write(path.as_ref(), S::format_id())
    }

    /// Root node view, recomputed from the stored bytes on demand.
    fn root(&self) -> NodeView<'_, Unit> {
        NodeView::root(self.store.trie_bytes())
    }

    fn decode_score(&self, rank: u64) -> S {
        S::decode(&self.store.score_bytes()[rank as usize..])
    }

    /// Returns `true` if the trie stores no suggestions.
    pub fn is_empty(&self) -> bool {
        self.root().is_leaf()
    }

    /// All stored suggestions in order of decreasing score.
    pub fn iter(&self) -> Completions<'_, S> {
        Completions {
            leaves: OrderedLeaves::new(SiblingCursor::children_of(&self.root())),
            trie: self,
        }
    }

    /// All suggestions extending `prefix`, best score first.
    ///
    /// The empty prefix completes to every stored suggestion.
    pub fn complete(&self, prefix: &str) -> Completions<'_, S> {
        if !self.is_empty() {
            let (node, consumed) = prefix_match(self.root(), prefix.as_bytes());
            if consumed == prefix.len() {
                return Completions {
                    leaves: OrderedLeaves::new(Some(SiblingCursor::single(node))),
                    trie: self,
                };
            }
        }
        Completions {
            leaves: OrderedLeaves::empty(),
            trie: self,
        }
    }

    /// Length in bytes of the longest prefix of `input` that is a prefix of
    /// some stored suggestion.
    pub fn mismatch(&self, input: &str) -> usize {
        prefix_match(self.root(), input.as_bytes()).1
    }

    /// Number of stored suggestions equal to `input`: zero or one.
    pub fn count(&self, input: &str) -> usize {
        usize::from(self.lookup(input).is_some())
    }

    /// The score stored for `input`.
    ///
    /// # Errors
    ///
    /// [`TrieError::NotFound`] if `input` is not stored;
    /// [`RankedTrie::find_score`] is the non-failing form.
    pub fn score(&self, input: &str) -> Result<S> {
        self.find_score(input).ok_or(TrieError::NotFound)
    }

    /// The score stored for `input`, or `None` if `input` is not stored.
    pub fn find_score(&self, input: &str) -> Option<S> {
        self.lookup(input)
            .map(|leaf| self.decode_score(leaf.rank()))
    }

    /// Exact-match lookup; the root itself never counts as a match.
    fn lookup(&self, input: &str) -> Option<NodeView<'_, Unit>> {
        let root = self.root();
        find_leaf(root, input.as_bytes()).filter(|leaf| leaf.pos() != root.pos())
    }
}

/// Iterator over [`Completion`]s in order of decreasing score.
///
/// Returned by [`RankedTrie::iter`] and [`RankedTrie::complete`]. Each step
/// reconstructs the suggestion text by walking the root-to-leaf path and
/// decodes the score from the trie's score table.
pub struct Completions<'a, S: Codec> {
    leaves: OrderedLeaves<'a, Unit>,
    trie: &'a RankedTrie<S>,
}

impl<S: Codec> Iterator for Completions<'_, S> {
    type Item = Completion<S>;

    fn next(&mut self) -> Option<Completion<S>> {
        let leaf = self.leaves.peek()?;

        let mut text = Vec::new();
        descend_path(self.trie.root(), &leaf, |node| {
            text.extend_from_slice(node.label());
        });
        let score = self.trie.decode_score(leaf.rank());
        self.leaves.advance();

        // Labels are byte slices of the input strings; concatenated along a
        // whole root-to-leaf path they always restore valid UTF-8.
        let text = String::from_utf8(text).expect("suggestion paths are valid UTF-8");
        Some(Completion { text, score })
    }
}
