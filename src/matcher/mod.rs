//! Multi-position streaming matcher.
//!
//! The matcher walks the input left to right exactly once, holding one
//! current trie block that resets at every delimiter. Word endings are
//! detected through the catalog's end-of-word index, and the per-position
//! active sets in the [`MatchContext`] thread partially matched patterns
//! from word to word. There is no per-query allocation beyond the result
//! vector and, when enabled, the matched substrings are borrowed straight
//! from the input.
//!
//! Matching never fails: malformed or empty input produces an empty list.

pub(crate) mod lcss;

mod context;

pub use context::MatchContext;

use crate::catalog::{PatternCatalog, PatternId};
use crate::classify::{class_of, next_boundary, DELIMITER};
use crate::config::MatchOptions;

use lcss::LcssTracker;

/// How a match was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Consecutive-token match.
    Exact,
    /// Relaxed in-order subsequence match.
    Lcss,
}

/// Byte span of a match within the trimmed input, with the substring
/// borrowed case-preserved from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan<'i> {
    pub start: usize,
    pub end: usize,
    pub text: &'i str,
}

/// One reported match. Metadata and display text borrow from the catalog;
/// the span, when present, borrows from the query input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord<'c, 'i> {
    pub pattern_id: PatternId,
    pub metadata: &'c str,
    pub display_text: &'c str,
    pub span: Option<MatchSpan<'i>>,
    pub kind: MatchKind,
}

/// Match an input string against a sealed catalog.
///
/// Exact matches are reported in completion order as the walk proceeds;
/// with `lcssmatch` enabled, qualifying LCSS matches follow in ascending
/// pattern-id order. The context is cleared on entry and may be reused
/// across queries of arbitrary length.
pub fn match_input<'c, 'i>(
    catalog: &'c PatternCatalog,
    input: &'i str,
    options: &MatchOptions,
    ctx: &mut MatchContext,
) -> Vec<MatchRecord<'c, 'i>> {
    let mut results = Vec::new();

    let input = input.trim();
    if input.is_empty() {
        return results;
    }

    let do_lcss = options.lcssmatch;
    let do_matching = options.matching;

    ctx.clear();
    if do_matching {
        ctx.ensure_capacity(catalog.pattern_count());
    }

    let mut lcss = if do_lcss {
        Some(LcssTracker::new())
    } else {
        None
    };

    let bytes = input.as_bytes();
    let mut current_block: u32 = 0;
    let mut at_word_start = true;

    for (byte_idx, &byte) in bytes.iter().enumerate() {
        let class = class_of(byte);

        if class == DELIMITER {
            current_block = 0;
            at_word_start = true;
            continue;
        }

        if at_word_start {
            // First byte of a token: no pattern word has length zero, so
            // there is nothing to complete yet.
            at_word_start = false;
            current_block = catalog.trie.child(0, class);
            continue;
        }

        if current_block == 0 {
            // Dead token: no pattern word starts with this token's prefix.
            // Skip bytes until the next delimiter resets the walk.
            continue;
        }

        if let Some(entry) = catalog.trie.end_of_word(current_block, class) {
            for (position, ids) in entry.iter() {
                if let Some(tracker) = lcss.as_mut() {
                    for &id in ids {
                        tracker.record(id, position, byte_idx);
                    }
                }

                if position == 1 {
                    if ctx.max_pos < 1 {
                        ctx.max_pos = 1;
                    }
                    for &id in ids {
                        ctx.active[1].insert(id);
                        if do_matching {
                            let first_len = catalog.word_len(id, 1) as usize;
                            ctx.start_of_match[id as usize] =
                                (byte_idx + 1).saturating_sub(first_len);
                        }
                    }
                } else {
                    let pos = position as usize;
                    let (lower, upper) = ctx.active.split_at_mut(pos);
                    let prev_active = &mut lower[pos - 1];
                    if prev_active.is_empty() {
                        continue;
                    }
                    let current_active = &mut upper[0];
                    if ctx.max_pos < position {
                        ctx.max_pos = position;
                    }

                    for &id in ids {
                        // Consuming the id out of the previous position is
                        // what makes the consecutive-word semantics hold: a
                        // pattern advances at most once per observed word.
                        if !prev_active.remove(&id) {
                            continue;
                        }

                        if catalog.word_count(id) == position {
                            if let Some(tracker) = lcss.as_mut() {
                                tracker.mark_exact(id);
                            }
                            let span = if do_matching {
                                let start = ctx.start_of_match[id as usize];
                                let end = next_boundary(bytes, byte_idx + 1);
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
                                kind: MatchKind::Exact,
                            });
                        } else {
                            current_active.insert(id);
                        }
                    }
                }
            }
        }

        current_block = catalog.trie.child(current_block, class);
    }

    if let Some(tracker) = lcss {
        tracker.emit(catalog, input, do_matching, &mut results);
    }

    results
}
