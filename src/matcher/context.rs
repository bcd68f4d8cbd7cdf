//! Per-worker reusable match state.
//!
//! A `MatchContext` is the only mutable state the matcher needs, so one
//! context per worker thread makes the whole engine lock-free: the sealed
//! catalog is shared read-only and every thread scribbles in its own
//! context. Contexts are cleared in O(touched positions) at the start of
//! each query and never reallocate after warm-up.

use std::collections::HashSet;

use crate::catalog::{PatternCatalog, PatternId};
use crate::catalog::trie::MAX_WORDS;

/// Scratch state for one match worker, reusable across queries.
#[derive(Debug, Default)]
pub struct MatchContext {
    /// `active[p]` holds pattern ids whose words 1..=p have all matched at
    /// the right positions earlier in the current input. Slot 0 is unused.
    pub(crate) active: [HashSet<PatternId>; MAX_WORDS + 1],

    /// Highest position touched since the last clear, bounding clear work.
    pub(crate) max_pos: u8,

    /// Byte offset where each pattern's first word began in the current
    /// input, indexed by pattern id. Only maintained when substring
    /// extraction is on.
    pub(crate) start_of_match: Vec<usize>,
}

impl MatchContext {
    /// Create an empty context. Capacity grows on first use; prefer
    /// [`MatchContext::for_catalog`] to warm up ahead of the first query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context pre-sized for a catalog's pattern count.
    pub fn for_catalog(catalog: &PatternCatalog) -> Self {
        let mut ctx = Self::default();
        ctx.ensure_capacity(catalog.pattern_count());
        ctx
    }

    /// Reset per-query state. Cost is proportional to the number of word
    /// positions touched by the previous query, not the catalog size.
    pub fn clear(&mut self) {
        for position in 1..=self.max_pos as usize {
            self.active[position].clear();
        }
        self.max_pos = 0;
    }

    /// Grow the start-offset array to cover `pattern_count` ids.
    pub(crate) fn ensure_capacity(&mut self, pattern_count: u32) {
        let needed = pattern_count as usize + 1;
        if self.start_of_match.len() < needed {
            self.start_of_match.resize(needed, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_only_touched_positions() {
        let mut ctx = MatchContext::new();
        ctx.active[1].insert(10);
        ctx.active[3].insert(20);
        ctx.max_pos = 3;

        ctx.clear();

        assert_eq!(ctx.max_pos, 0);
        assert!(ctx.active[1].is_empty());
        assert!(ctx.active[3].is_empty());
    }

    #[test]
    fn test_ensure_capacity_grows_once() {
        let mut ctx = MatchContext::new();
        ctx.ensure_capacity(100);
        assert_eq!(ctx.start_of_match.len(), 101);

        // Smaller requests never shrink.
        ctx.ensure_capacity(10);
        assert_eq!(ctx.start_of_match.len(), 101);
    }

    #[test]
    fn test_all_positions_available() {
        let ctx = MatchContext::new();
        assert_eq!(ctx.active.len(), MAX_WORDS + 1);
    }
}
