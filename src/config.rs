//! Caller-supplied option record shared by ingestion and matching.
//!
//! `removestopwords` and `address_mode` take effect while the catalog is
//! being built; `matching` and `lcssmatch` take effect per query. A single
//! record carries all four so a front end can thread one value through both
//! phases.

/// Flags controlling preprocessing and matching behavior.
///
/// # Example
/// ```rust,ignore
/// use prefix_match::MatchOptions;
///
/// let options = MatchOptions::new()
///     .with_matching(true)
///     .with_stopword_removal(true);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Report the matched substring (case-preserved from the input) with
    /// each match instead of a caller-side positional identifier.
    pub matching: bool,

    /// Also report relaxed in-order subsequence (LCSS) matches.
    pub lcssmatch: bool,

    /// Drop stopwords from pattern records during preprocessing. Requires a
    /// stopword set to have been loaded into the builder.
    pub removestopwords: bool,

    /// Instead of rejecting records with characters outside the whitelist,
    /// replace every non-alphanumeric character with a space and continue.
    pub address_mode: bool,
}

impl MatchOptions {
    /// Create an option record with everything disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable matched-substring extraction.
    pub fn with_matching(mut self, enable: bool) -> Self {
        self.matching = enable;
        self
    }

    /// Enable or disable LCSS (relaxed subsequence) matching.
    pub fn with_lcss(mut self, enable: bool) -> Self {
        self.lcssmatch = enable;
        self
    }

    /// Enable or disable stopword removal during preprocessing.
    pub fn with_stopword_removal(mut self, enable: bool) -> Self {
        self.removestopwords = enable;
        self
    }

    /// Enable or disable address mode for non-alphanumeric records.
    pub fn with_address_mode(mut self, enable: bool) -> Self {
        self.address_mode = enable;
        self
    }
}
