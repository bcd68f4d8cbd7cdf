//! Relaxed in-order subsequence (LCSS) matching.
//!
//! Exact mode demands consecutive tokens; LCSS mode only demands that a
//! pattern's words appear in order, possibly with other tokens in between.
//! During the trie walk every (pattern, position) sighting is recorded with
//! its byte offset; afterwards a pattern qualifies when the longest
//! strictly increasing run of those offsets, taken in word-position order,
//! covers at least three words and every must-have position was seen.

use std::collections::{HashMap, HashSet};

use crate::catalog::{PatternCatalog, PatternId};
use crate::classify::next_boundary;

use super::{MatchKind, MatchRecord, MatchSpan};

/// Minimum number of in-order words for an LCSS match.
const MIN_LCSS_WORDS: usize = 3;

/// Longest strictly increasing subsequence, returned as the subsequence
/// values. O(n log n) patience variant with predecessor reconstruction.
pub(crate) fn longest_increasing_subsequence(input: &[usize]) -> Vec<usize> {
    if input.is_empty() {
        return Vec::new();
    }

    let n = input.len();
    // tails[j] = index of the smallest ending element of an increasing
    // subsequence of length j; slot 0 unused.
    let mut tails = vec![0usize; n + 1];
    let mut prev = vec![usize::MAX; n];
    let mut longest = 0usize;

    for i in 0..n {
        // Largest j with input[tails[j]] < input[i].
        let mut lo = 1usize;
        let mut hi = longest + 1;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if input[tails[mid]] < input[i] {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        prev[i] = if lo > 1 { tails[lo - 1] } else { usize::MAX };
        tails[lo] = i;
        if lo > longest {
            longest = lo;
        }
    }

    let mut result = vec![0usize; longest];
    let mut k = tails[longest];
    for slot in result.iter_mut().rev() {
        *slot = input[k];
        k = prev[k];
    }
    result
}

/// Accumulates (pattern, position) sightings during a walk and emits the
/// qualifying LCSS matches afterwards.
#[derive(Debug, Default)]
pub(crate) struct LcssTracker {
    /// pattern id -> (word position -> last byte offset where it ended).
    seen: HashMap<PatternId, HashMap<u8, usize>>,
    /// Patterns that already completed exactly; suppressed from LCSS
    /// output to avoid duplicate reporting.
    found_exact: HashSet<PatternId>,
}

impl LcssTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record(&mut self, id: PatternId, position: u8, offset: usize) {
        self.seen.entry(id).or_default().insert(position, offset);
    }

    #[inline]
    pub(crate) fn mark_exact(&mut self, id: PatternId) {
        self.found_exact.insert(id);
    }

    /// Emit LCSS matches in ascending pattern-id order, appended after the
    /// exact matches already collected.
    pub(crate) fn emit<'c, 'i>(
        &self,
        catalog: &'c PatternCatalog,
        input: &'i str,
        matching: bool,
        results: &mut Vec<MatchRecord<'c, 'i>>,
    ) {
        let mut candidates: Vec<PatternId> = self.seen.keys().copied().collect();
        candidates.sort_unstable();

        let bytes = input.as_bytes();
        for id in candidates {
            if self.found_exact.contains(&id) {
                continue;
            }
            let observed = &self.seen[&id];

            if !catalog
                .must_have_positions(id)
                .iter()
                .all(|p| observed.contains_key(p))
            {
                continue;
            }

            // Offsets in word-position order; the increasing runs within
            // this sequence are the in-order occurrences.
            let mut ordered: Vec<(u8, usize)> = Vec::with_capacity(observed.len());
            for position in 1..=catalog.word_count(id) {
                if let Some(&offset) = observed.get(&position) {
                    ordered.push((position, offset));
                }
            }
            let offsets: Vec<usize> = ordered.iter().map(|&(_, off)| off).collect();
            let subsequence = longest_increasing_subsequence(&offsets);
            if subsequence.len() < MIN_LCSS_WORDS {
                continue;
            }

            let span = if matching {
                let first_offset = subsequence[0];
                let last_offset = *subsequence.last().unwrap_or(&first_offset);
                let first_position = ordered
                    .iter()
                    .find(|&&(_, off)| off == first_offset)
                    .map(|&(p, _)| p)
                    .unwrap_or(1);
                let start =
                    (first_offset + 1).saturating_sub(catalog.word_len(id, first_position) as usize);
                let end = next_boundary(bytes, last_offset + 1);
                Some(MatchSpan {
                    start,
                    end,
                    text: &input[start..end],
                })
            } else {
                None
            };

            results.push(MatchRecord {
                pattern_id: id,
                metadata: catalog.metadata(id),
                display_text: catalog.display_text(id),
                span,
                kind: MatchKind::Lcss,
            });
        }
    }
}
