//! Command-line argument parsing with clap derive.

use std::path::PathBuf;

use clap::Parser;

use crate::config::MatchOptions;

/// High-throughput prefix matching for URL and short-text categorization
#[derive(Parser, Debug)]
#[command(name = "prefix-match")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Pattern file, plain or gzip (required)
    #[arg(short = 'p', long = "patterns", value_name = "FILE")]
    pub patterns: PathBuf,

    /// String file to match in batch mode, plain or gzip
    #[arg(short = 's', long = "strings", value_name = "FILE")]
    pub strings: Option<PathBuf>,

    /// Stopwords file (single comma-separated list)
    #[arg(short = 'w', long = "stopwords", value_name = "FILE")]
    pub stopwords: Option<PathBuf>,

    /// Start a TCP server on this port
    #[arg(short = 'P', long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// Start a Unix socket server on this path
    #[arg(short = 'S', long = "socket", value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Number of worker threads (default: all cores)
    #[arg(short = 't', long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Extract the matching substring for each match
    #[arg(short = 'm', long = "matching")]
    pub matching: bool,

    /// Enable LCSS (relaxed subsequence) matching
    #[arg(short = 'L', long = "lcss")]
    pub lcss: bool,

    /// Remove stopwords from patterns during loading
    #[arg(short = 'W', long = "removestopwords")]
    pub removestopwords: bool,

    /// Scrub punctuation from patterns instead of rejecting them
    #[arg(long = "address")]
    pub address: bool,

    /// Re-match each reported substring and warn on mismatch
    #[arg(short = 'v', long = "verify")]
    pub verify: bool,

    /// Log pattern file processing
    #[arg(short = 'l', long = "logperf")]
    pub logperf: bool,

    /// Quiet mode (suppress statistics output)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    pub fn to_options(&self) -> MatchOptions {
        MatchOptions::new()
            .with_matching(self.matching)
            .with_lcss(self.lcss)
            .with_stopword_removal(self.removestopwords)
            .with_address_mode(self.address)
    }
}
