use std::collections::BTreeSet;

use proptest::prelude::*;

use crate::varint::{OffsetVarint, RankVarint};
use crate::RankedTrie;

/// Brute-force model over the same entries, kept sorted by text.
struct Model {
    entries: Vec<(String, u64)>,
}

impl Model {
    fn complete(&self, prefix: &str) -> Vec<(String, u64)> {
        self.entries
            .iter()
            .filter(|(text, _)| text.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn score(&self, input: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(text, _)| text == input)
            .map(|(_, score)| *score)
    }

    fn mismatch(&self, input: &str) -> usize {
        self.entries
            .iter()
            .map(|(text, _)| {
                input
                    .bytes()
                    .zip(text.bytes())
                    .take_while(|(a, b)| a == b)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }
}

/// Sorted unique corpora over a narrow alphabet, so shared prefixes and
/// prefix-of-another suggestions occur constantly. The score range is small
/// enough to exercise score-table deduplication on most cases.
fn corpus() -> impl Strategy<Value = Vec<(String, u64)>> {
    prop::collection::btree_map("[ab]{0,10}", 0..32u64, 0..48)
        .prop_map(|map| map.into_iter().collect())
}

/// Every prefix of every suggestion, one strict extension each, and a few
/// probes that match nothing.
fn probes(entries: &[(String, u64)]) -> BTreeSet<String> {
    let mut result = BTreeSet::new();
    result.insert(String::new());
    result.insert("zz".to_string());
    for (text, _) in entries {
        for len in 0..=text.len() {
            result.insert(text[..len].to_string());
        }
        result.insert(format!("{text}c"));
    }
    result
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn trie_agrees_with_brute_force_model(entries in corpus()) {
        let trie = RankedTrie::from_entries(&entries).unwrap();
        let model = Model { entries: entries.clone() };

        prop_assert_eq!(trie.is_empty(), entries.is_empty());
        prop_assert_eq!(trie.iter().count(), entries.len());

        for prefix in probes(&entries) {
            let got: Vec<(String, u64)> = trie.complete(&prefix).map(Into::into).collect();

            // Scores come out non-increasing, and the completion set is
            // exactly the model's.
            prop_assert!(got.windows(2).all(|w| w[0].1 >= w[1].1), "prefix {:?}", prefix);
            let mut got_sorted = got.clone();
            got_sorted.sort();
            let mut expected = model.complete(&prefix);
            expected.sort();
            prop_assert_eq!(&got_sorted, &expected, "prefix {:?}", prefix);

            prop_assert_eq!(trie.mismatch(&prefix), model.mismatch(&prefix), "prefix {:?}", prefix);
            prop_assert_eq!(trie.find_score(&prefix), model.score(&prefix), "prefix {:?}", prefix);
            prop_assert_eq!(
                trie.count(&prefix),
                usize::from(model.score(&prefix).is_some()),
                "prefix {:?}",
                prefix
            );
        }
    }

    #[test]
    fn persisted_trie_agrees_with_the_original(entries in corpus()) {
        let trie = RankedTrie::from_entries(&entries).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        trie.write(file.path()).unwrap();
        let loaded = RankedTrie::<u64>::read(file.path()).unwrap();

        let original: Vec<(String, u64)> = trie.iter().map(Into::into).collect();
        let reloaded: Vec<(String, u64)> = loaded.iter().map(Into::into).collect();
        prop_assert_eq!(original, reloaded);

        for prefix in probes(&entries) {
            prop_assert_eq!(trie.count(&prefix), loaded.count(&prefix));
            prop_assert_eq!(trie.mismatch(&prefix), loaded.mismatch(&prefix));
        }
    }

    #[test]
    fn rank_codec_round_trips(value in any::<u64>()) {
        let mut buf = Vec::new();
        let tag = RankVarint::encode(&mut buf, value);
        prop_assert_eq!(RankVarint::decode(&buf, tag), value);
        prop_assert_eq!(RankVarint::encoded_len(&buf, tag), buf.len());
    }

    #[test]
    fn offset_codec_round_trips(value in any::<u64>()) {
        let mut buf = Vec::new();
        let tag = OffsetVarint::encode(&mut buf, value);
        prop_assert_eq!(OffsetVarint::decode(&buf, tag), value);
        prop_assert_eq!(OffsetVarint::codeword_size(tag), buf.len());
    }
}
