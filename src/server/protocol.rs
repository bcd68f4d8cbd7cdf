//! Wire protocol: request parsing, response shapes, and brace framing.
//!
//! Requests are JSON objects carrying an `id` and either a single `query`
//! or a `queries` array. Responses echo the id with a status of 200 when
//! anything matched, 404 when nothing did, and 400 for malformed requests.
//! Because clients may stream several objects per write (or split one
//! across writes), the connection handler frames on matching braces before
//! handing a complete object to serde.

use serde::{Deserialize, Serialize};

use crate::matcher::MatchRecord;

#[derive(Debug, Deserialize)]
struct RawRequest {
    id: Option<String>,
    query: Option<String>,
    queries: Option<Vec<String>>,
}

/// A request after validation.
#[derive(Debug, PartialEq)]
pub(crate) enum ParsedRequest {
    Valid {
        id: String,
        queries: Vec<String>,
        /// Batch responses are only used for multi-query requests; a
        /// one-element `queries` array answers in the single shape.
        batch: bool,
    },
    Invalid {
        id: String,
        error: String,
    },
}

/// Parse and validate one framed JSON object.
pub(crate) fn parse_request(json: &str) -> ParsedRequest {
    let raw: RawRequest = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            return ParsedRequest::Invalid {
                id: "unknown".to_string(),
                error: format!("Invalid JSON: {e}"),
            }
        }
    };

    let id = match raw.id {
        Some(id) => id,
        None => {
            return ParsedRequest::Invalid {
                id: "unknown".to_string(),
                error: "Missing 'id' field".to_string(),
            }
        }
    };

    let queries = match (raw.query, raw.queries) {
        (Some(query), _) => vec![query],
        (None, Some(queries)) => queries,
        (None, None) => {
            return ParsedRequest::Invalid {
                id,
                error: "Missing 'query' or 'queries' field".to_string(),
            }
        }
    };

    let batch = queries.len() > 1;
    ParsedRequest::Valid { id, queries, batch }
}

/// One match in a response. The metadata blob's first tab-separated field
/// is surfaced as `id` and the second as `category`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchObject {
    pub category: String,
    pub id: String,
    pub pattern: String,
    #[serde(rename = "match")]
    pub matched: String,
}

impl MatchObject {
    pub fn from_record(record: &MatchRecord<'_, '_>) -> Self {
        let mut fields = record.metadata.split('\t');
        let id = fields.next().unwrap_or("").to_string();
        let category = fields.next().unwrap_or("").to_string();
        Self {
            category,
            id,
            pattern: record.display_text.to_string(),
            matched: record.span.map(|s| s.text.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SingleResponse {
    pub id: String,
    pub status: u16,
    pub results: Vec<MatchObject>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchEntry {
    pub index: usize,
    pub matches: Vec<MatchObject>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub id: String,
    pub status: u16,
    pub results: Vec<BatchEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub id: String,
    pub status: u16,
    pub error: String,
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Find the closing brace of the JSON object starting at `start`, honoring
/// strings and escapes. Returns `None` while the object is incomplete.
pub(crate) fn find_json_end(buf: &[u8], start: usize) -> Option<usize> {
    if buf.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for (i, &byte) in buf.iter().enumerate().skip(start) {
        if escape {
            escape = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escape = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}
