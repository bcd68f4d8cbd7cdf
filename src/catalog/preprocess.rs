//! Pattern record normalization.
//!
//! Raw catalog records arrive as free-text word sequences and leave here as
//! the exact word list that gets inserted into the trie. The pipeline runs
//! lowercasing, whitespace splitting, short-word removal, optional stopword
//! removal, then adjacent-prefix shortening, and rejects anything that ends
//! up shorter than two words.

use std::collections::HashSet;

use crate::config::MatchOptions;

/// Remove the `*`/`^` must-have markers from a word. Used for the
/// adjacent-prefix comparison, which must see the words as they will be
/// matched, not as they are written.
pub(crate) fn strip_markers(word: &str) -> String {
    word.chars().filter(|c| *c != '*' && *c != '^').collect()
}

/// Replace every character that is neither alphanumeric nor whitespace
/// with a space. Address mode runs records through this instead of
/// rejecting them.
pub(crate) fn scrub_non_alphanumeric(pattern: &str) -> String {
    pattern
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_ascii_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

/// Normalize a raw pattern string into its final word list.
///
/// Returns an empty vector when fewer than two words survive; such records
/// are non-conforming and must not be admitted. Must-have markers are left
/// in place: the builder strips them at insertion time, after positions
/// are final.
pub(crate) fn normalize_words(
    pattern: &str,
    options: &MatchOptions,
    stopwords: &HashSet<String>,
) -> Vec<String> {
    let lowered = pattern.to_lowercase();
    let mut words: Vec<String> = lowered.split_whitespace().map(str::to_string).collect();
    let original_count = words.len();

    words.retain(|w| w.len() > 1);

    if options.removestopwords {
        words.retain(|w| !stopwords.contains(w));
    }

    // Adjacent-prefix shortening: a word that is a prefix of the word right
    // after it would fire on every occurrence of the longer word, so it is
    // dropped. Only positions before the last are tested; the last word is
    // always kept.
    if original_count != 1 && words.len() > 1 {
        let stripped: Vec<String> = words.iter().map(|w| strip_markers(w)).collect();
        let last = words.len() - 1;
        let mut filtered = Vec::with_capacity(words.len());
        for (i, word) in words.into_iter().enumerate() {
            if i == last || !stripped[i + 1].starts_with(stripped[i].as_str()) {
                filtered.push(word);
            }
        }
        words = filtered;
    }

    if words.len() < 2 {
        return Vec::new();
    }

    words
}
