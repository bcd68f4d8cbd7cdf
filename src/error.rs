//! Error types for the prefix-match crate.
//!
//! Only catalog construction can fail: an unreadable pattern or stopword
//! source aborts the build, per-record problems are logged rejections, and
//! matching itself is total. The server layer adds one variant for socket
//! setup; malformed requests are answered on the wire, not raised.

use std::fmt;

pub type Result<T> = std::result::Result<T, PrefixMatchError>;

#[derive(Debug, Clone, PartialEq)]
pub enum PrefixMatchError {
    IoError(String),
    PatternSource(String),
    StopwordSource(String),
    ServerError(String),
}

impl fmt::Display for PrefixMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixMatchError::IoError(msg) => write!(f, "IO error: {msg}"),
            PrefixMatchError::PatternSource(msg) => write!(f, "Pattern source error: {msg}"),
            PrefixMatchError::StopwordSource(msg) => write!(f, "Stopword source error: {msg}"),
            PrefixMatchError::ServerError(msg) => write!(f, "Server error: {msg}"),
        }
    }
}

impl std::error::Error for PrefixMatchError {}

impl From<std::io::Error> for PrefixMatchError {
    fn from(err: std::io::Error) -> Self {
        PrefixMatchError::IoError(err.to_string())
    }
}
