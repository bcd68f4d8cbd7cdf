//! # Prefix-Match Engine
//!
//! A high-throughput, low-latency prefix-matching engine for URL and
//! short-text categorization, built for real-time bidding pipelines with
//! sub-millisecond per-query budgets.
//!
//! ## Architecture
//!
//! The crate splits build time from query time:
//! - **Catalog build** (offline): pattern records are preprocessed and
//!   compiled into a compact 37-ary trie with an end-of-word index, then
//!   sealed read-only.
//! - **Matching** (online): a single left-to-right walk over the input
//!   tracks every partially matched pattern through per-position active
//!   sets, with no allocation on the hot path after warm-up.
//!
//! Worker threads share one sealed catalog behind an `Arc` and own their
//! scratch [`MatchContext`]; no locks are taken while matching.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use prefix_match::{build_catalog, match_input, MatchContext, MatchOptions, NullLogger};
//!
//! let source = "cnn com politics\tNP001\tnews_politics\n".as_bytes();
//! let options = MatchOptions::new().with_matching(true);
//!
//! let catalog = build_catalog(source, &options, &NullLogger)?;
//! let mut ctx = MatchContext::for_catalog(&catalog);
//!
//! let matches = match_input(&catalog, "https://cnn.com/politics/x", &options, &mut ctx);
//! for m in &matches {
//!     println!("{} -> {}", m.display_text, m.span.unwrap().text);
//! }
//! ```

pub mod batch;
pub mod catalog;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod logger;
pub mod matcher;
pub mod server;

pub use catalog::{
    build_catalog, CatalogBuilder, PatternCatalog, PatternId, RecordOutcome, RejectReason,
};
pub use config::MatchOptions;
pub use error::{PrefixMatchError, Result};
pub use logger::{LogAdapter, Logger, NullLogger, StdoutLogger};
pub use matcher::{match_input, MatchContext, MatchKind, MatchRecord, MatchSpan};
pub use server::{Server, ServerHandle};
