//! Catalog ingestion: record admission, stopword loading, trie insertion.

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Read};
use std::path::Path;
use std::time::Instant;

use regex::Regex;

use crate::config::MatchOptions;
use crate::error::{PrefixMatchError, Result};
use crate::input::open_lines;
use crate::logger::Logger;

use super::preprocess::{normalize_words, scrub_non_alphanumeric};
use super::trie::{Trie, MAX_WORDS};
use super::{PatternCatalog, PatternId};

/// Words that stay matchable no matter what the stopword file says.
const PROTECTED_STOPWORDS: [&str; 10] = [
    "system",
    "second",
    "little",
    "course",
    "world",
    "value",
    "right",
    "needs",
    "information",
    "invention",
];

/// Why a record was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Comment,
    Empty,
    ExceptionPattern,
    NonAlphanumeric,
    NonConforming,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RejectReason::Comment => "comment",
            RejectReason::Empty => "empty",
            RejectReason::ExceptionPattern => "exception pattern",
            RejectReason::NonAlphanumeric => "non alphanumeric characters",
            RejectReason::NonConforming => "non-conforming pattern",
        };
        f.write_str(text)
    }
}

/// Outcome of feeding one record to the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Admitted(PatternId),
    Rejected(RejectReason),
}

/// Accumulates patterns and produces a sealed [`PatternCatalog`].
#[derive(Debug)]
pub struct CatalogBuilder {
    options: MatchOptions,
    stopwords: HashSet<String>,
    valid_chars: Regex,
    trie: Trie,
    xref: Vec<String>,
    display: Vec<String>,
    word_counts: Vec<u8>,
    word_lengths: Vec<Vec<u8>>,
    must_have: HashMap<PatternId, Vec<u8>>,
}

impl CatalogBuilder {
    pub fn new(options: MatchOptions) -> Self {
        Self {
            options,
            stopwords: HashSet::new(),
            valid_chars: Regex::new(r"^[A-Za-z0-9\s*\-^]*$")
                .expect("hard-coded character whitelist compiles"),
            trie: Trie::new(),
            // Slot 0 of the parallel vectors is unused; ids are 1-based.
            xref: vec![String::new()],
            display: vec![String::new()],
            word_counts: vec![0],
            word_lengths: vec![Vec::new()],
            must_have: HashMap::new(),
        }
    }

    /// Number of patterns admitted so far.
    pub fn pattern_count(&self) -> u32 {
        (self.xref.len() - 1) as u32
    }

    /// Load a comma-separated stopword list. Entries are trimmed and
    /// lowercased; protected words are kept out of the set regardless of
    /// the file contents.
    pub fn load_stopwords<R: Read>(&mut self, mut source: R, logger: &dyn Logger) -> Result<usize> {
        let mut content = String::new();
        source
            .read_to_string(&mut content)
            .map_err(|e| PrefixMatchError::StopwordSource(e.to_string()))?;

        for entry in content.split(',') {
            let word = entry.trim().to_lowercase();
            if word.is_empty() || PROTECTED_STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            self.stopwords.insert(word);
        }

        logger.info(&format!("Loaded {} stopwords", self.stopwords.len()));
        Ok(self.stopwords.len())
    }

    /// Provide an already-loaded stopword collection. Entries go through
    /// the same lowercasing and protected-word filter as the file loader.
    pub fn add_stopwords<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if word.is_empty() || PROTECTED_STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            self.stopwords.insert(word);
        }
    }

    /// Load stopwords from a file path.
    pub fn load_stopwords_file(&mut self, path: &Path, logger: &dyn Logger) -> Result<usize> {
        logger.info(&format!("Reading stopwords: {}", path.display()));
        let file = std::fs::File::open(path).map_err(|e| {
            PrefixMatchError::StopwordSource(format!("{}: {}", path.display(), e))
        })?;
        self.load_stopwords(file, logger)
    }

    /// Process one raw record: classify, preprocess, and on success insert
    /// the pattern into the trie under the next id.
    pub fn add_record(&mut self, line: &str, logger: &dyn Logger) -> RecordOutcome {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            return RecordOutcome::Rejected(RejectReason::Empty);
        }
        if trimmed.starts_with('#') {
            return RecordOutcome::Rejected(RejectReason::Comment);
        }
        if trimmed.contains("_EXCEPTIONS") {
            return RecordOutcome::Rejected(RejectReason::ExceptionPattern);
        }

        // First tab-separated field is the pattern; the remainder is kept
        // verbatim as opaque metadata.
        let mut fields = trimmed.splitn(2, '\t');
        let raw_pattern = fields.next().unwrap_or("");
        let xref = fields.next().unwrap_or("");

        let mut pattern = raw_pattern.to_string();
        if !self.valid_chars.is_match(&pattern) {
            logger.info(&format!("Pattern with non alphanumeric char: {pattern}"));
            if !self.options.address_mode {
                return RecordOutcome::Rejected(RejectReason::NonAlphanumeric);
            }
            pattern = scrub_non_alphanumeric(&pattern);
        }

        let words = normalize_words(&pattern, &self.options, &self.stopwords);
        if words.is_empty() || words.len() > MAX_WORDS {
            if words.len() > MAX_WORDS {
                logger.info(&format!(
                    "Pattern exceeds {MAX_WORDS} words after preprocessing: {pattern}"
                ));
            } else if words.len() != pattern.split_whitespace().count() {
                logger.info(&format!(
                    "Pattern_ref: '{xref}' changed from: '{pattern}' to: '{}'",
                    words.join(" ")
                ));
            }
            return RecordOutcome::Rejected(RejectReason::NonConforming);
        }

        let id = self.xref.len() as PatternId;

        let mut lengths = Vec::with_capacity(words.len());
        let mut real_words = Vec::with_capacity(words.len());
        for (index, word) in words.iter().enumerate() {
            let position = (index + 1) as u8;
            let real = match word.strip_prefix(['*', '^']) {
                Some(stripped) => {
                    self.must_have.entry(id).or_default().push(position);
                    stripped
                }
                None => word.as_str(),
            };
            lengths.push(real.len() as u8);
            self.trie.insert_word(id, real, position);
            real_words.push(real);
        }

        self.xref.push(xref.to_string());
        self.display.push(real_words.join(" "));
        self.word_counts.push(words.len() as u8);
        self.word_lengths.push(lengths);

        RecordOutcome::Admitted(id)
    }

    /// Ingest a whole line source, logging rejections with their line
    /// numbers. Returns the number of admitted patterns.
    pub fn load_patterns<R: BufRead>(
        &mut self,
        source: R,
        name: &str,
        logger: &dyn Logger,
    ) -> Result<usize> {
        let start = Instant::now();
        let mut admitted = 0usize;

        for (index, line) in source.lines().enumerate() {
            let line =
                line.map_err(|e| PrefixMatchError::PatternSource(format!("{name}: {e}")))?;
            match self.add_record(&line, logger) {
                RecordOutcome::Admitted(_) => admitted += 1,
                RecordOutcome::Rejected(RejectReason::Comment)
                | RecordOutcome::Rejected(RejectReason::Empty) => {}
                RecordOutcome::Rejected(reason) => {
                    logger.info(&format!(
                        "Pattern not processed: {name} line {} '{}': {reason}",
                        index + 1,
                        line.trim()
                    ));
                }
            }
        }

        logger.info(&format!(
            "Loaded {admitted} patterns from {name} in {}ms",
            start.elapsed().as_millis()
        ));
        logger.info(&format!("Total blocks: {}", self.trie.block_count()));

        Ok(admitted)
    }

    /// Ingest a pattern file, gzip or plain.
    pub fn load_patterns_file(&mut self, path: &Path, logger: &dyn Logger) -> Result<usize> {
        let reader = open_lines(path).map_err(|e| {
            let msg = format!("Cannot open pattern file: {}: {e}", path.display());
            logger.error(&msg);
            PrefixMatchError::PatternSource(msg)
        })?;
        self.load_patterns(reader, &path.display().to_string(), logger)
    }

    /// Freeze ingestion and return the read-only catalog.
    pub fn seal(self) -> PatternCatalog {
        PatternCatalog::from_parts(
            self.trie,
            self.xref,
            self.display,
            self.word_counts,
            self.word_lengths,
            self.must_have,
        )
    }
}
