//! Build-once / read-many pattern catalog.
//!
//! Ingestion runs through [`CatalogBuilder`]: records are preprocessed,
//! admitted patterns get sequential 1-based ids, and each word lands in the
//! trie at its position. `seal()` then hands back a [`PatternCatalog`] that
//! exposes only read access; there is no way to mutate a sealed catalog,
//! which is what lets match workers share it without locks.

pub(crate) mod preprocess;
pub(crate) mod trie;

mod builder;

pub use builder::{CatalogBuilder, RecordOutcome, RejectReason};

use std::collections::HashMap;
use std::io::BufRead;

use crate::config::MatchOptions;
use crate::error::Result;
use crate::logger::Logger;

use trie::Trie;

/// Pattern identifier, assigned in admission order starting at 1.
pub type PatternId = u32;

/// Sealed, read-only pattern store: the trie, the end-of-word index, and
/// per-pattern metadata.
#[derive(Debug)]
pub struct PatternCatalog {
    pub(crate) trie: Trie,
    // Parallel vectors indexed by pattern id; slot 0 is unused.
    xref: Vec<String>,
    display: Vec<String>,
    word_counts: Vec<u8>,
    word_lengths: Vec<Vec<u8>>,
    must_have: HashMap<PatternId, Vec<u8>>,
}

impl PatternCatalog {
    pub(crate) fn from_parts(
        trie: Trie,
        xref: Vec<String>,
        display: Vec<String>,
        word_counts: Vec<u8>,
        word_lengths: Vec<Vec<u8>>,
        must_have: HashMap<PatternId, Vec<u8>>,
    ) -> Self {
        Self {
            trie,
            xref,
            display,
            word_counts,
            word_lengths,
            must_have,
        }
    }

    /// Number of admitted patterns; also the highest pattern id.
    pub fn pattern_count(&self) -> u32 {
        (self.xref.len() - 1) as u32
    }

    /// Number of allocated trie blocks.
    pub fn block_count(&self) -> u32 {
        self.trie.block_count()
    }

    /// The opaque metadata blob stored with a pattern, echoed in matches.
    pub fn metadata(&self, id: PatternId) -> &str {
        &self.xref[id as usize]
    }

    /// The canonical space-joined preprocessed words of a pattern.
    pub fn display_text(&self, id: PatternId) -> &str {
        &self.display[id as usize]
    }

    /// Iterate all admitted pattern ids in admission order.
    pub fn pattern_ids(&self) -> impl Iterator<Item = PatternId> {
        1..=self.pattern_count()
    }

    pub(crate) fn word_count(&self, id: PatternId) -> u8 {
        self.word_counts[id as usize]
    }

    /// Byte length of the word at 1-based `position` within pattern `id`.
    pub(crate) fn word_len(&self, id: PatternId, position: u8) -> u8 {
        self.word_lengths[id as usize][position as usize - 1]
    }

    pub(crate) fn must_have_positions(&self, id: PatternId) -> &[u8] {
        self.must_have.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rough estimate of heap bytes held by the catalog, for startup
    /// reporting.
    pub fn memory_usage(&self) -> usize {
        let mut total = self.trie.memory_usage();
        for s in &self.xref {
            total += s.capacity();
        }
        for s in &self.display {
            total += s.capacity();
        }
        total += self.xref.capacity() * std::mem::size_of::<String>();
        total += self.display.capacity() * std::mem::size_of::<String>();
        total += self.word_counts.capacity();
        for lengths in &self.word_lengths {
            total += lengths.capacity();
        }
        total += self.word_lengths.capacity() * std::mem::size_of::<Vec<u8>>();
        total += self
            .must_have
            .values()
            .map(|v| v.capacity() + std::mem::size_of::<PatternId>())
            .sum::<usize>();
        total
    }
}

/// Build a sealed catalog from a line source in one pass.
///
/// Convenience wrapper over [`CatalogBuilder`] for callers that have no
/// stopword set and a single source.
pub fn build_catalog<R: BufRead>(
    source: R,
    options: &MatchOptions,
    logger: &dyn Logger,
) -> Result<PatternCatalog> {
    let mut builder = CatalogBuilder::new(*options);
    builder.load_patterns(source, "<memory>", logger)?;
    Ok(builder.seal())
}
