//! Socket servers speaking the JSON match protocol.
//!
//! Both the TCP and the Unix-domain flavor share one model: an accept loop
//! on its own thread, one handler thread per connection (capped at 50),
//! and a per-connection [`MatchContext`] reused across that connection's
//! requests. Batch requests fan their queries out over the rayon pool with
//! one context per worker. The catalog is shared read-only behind an `Arc`;
//! nothing in the request path takes a lock.

pub mod protocol;

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rayon::prelude::*;

use crate::catalog::PatternCatalog;
use crate::config::MatchOptions;
use crate::error::{PrefixMatchError, Result};
use crate::matcher::{match_input, MatchContext};

use protocol::{
    find_json_end, parse_request, to_json, BatchEntry, BatchResponse, ErrorResponse, MatchObject,
    ParsedRequest, SingleResponse,
};

/// Upper bound on concurrent connections; beyond it new clients are
/// dropped at accept time.
const MAX_CONNECTIONS: usize = 50;

/// Idle connections are closed after this long without a readable byte.
const READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Poll interval of the nonblocking accept loop, which doubles as the
/// shutdown-check cadence.
const ACCEPT_POLL: Duration = Duration::from_millis(100);

#[derive(Clone)]
struct Shared {
    catalog: Arc<PatternCatalog>,
    options: MatchOptions,
    running: Arc<AtomicBool>,
    connections: Arc<AtomicUsize>,
}

/// Match server over a shared sealed catalog.
pub struct Server {
    shared: Shared,
}

impl Server {
    /// Create a server. Substring extraction is always on in server mode;
    /// clients get the matched span regardless of the batch-side flag.
    pub fn new(catalog: Arc<PatternCatalog>, options: MatchOptions) -> Self {
        Self {
            shared: Shared {
                catalog,
                options: options.with_matching(true),
                running: Arc::new(AtomicBool::new(true)),
                connections: Arc::new(AtomicUsize::new(0)),
            },
        }
    }

    /// Bind a TCP port and start accepting. Port 0 picks an ephemeral
    /// port; the bound address is available on the returned handle.
    pub fn start_tcp(&self, port: u16) -> Result<ServerHandle> {
        let listener = TcpListener::bind(("0.0.0.0", port)).map_err(|e| {
            PrefixMatchError::ServerError(format!("Cannot bind TCP port {port}: {e}"))
        })?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        log::info!("Server listening on TCP port {}", addr.port());

        let shared = self.shared.clone();
        let thread = thread::spawn(move || tcp_accept_loop(listener, shared));
        log::info!(
            "Ready to receive queries ({} worker threads)",
            rayon::current_num_threads()
        );

        Ok(ServerHandle {
            addr: Some(addr),
            socket_path: None,
            running: Arc::clone(&self.shared.running),
            thread: Some(thread),
        })
    }

    /// Bind a Unix domain socket and start accepting. A stale socket file
    /// at `path` is removed first; the handle unlinks it again on stop.
    pub fn start_unix(&self, path: &Path) -> Result<ServerHandle> {
        let _ = std::fs::remove_file(path);
        let listener = UnixListener::bind(path).map_err(|e| {
            PrefixMatchError::ServerError(format!("Cannot bind socket {}: {e}", path.display()))
        })?;
        listener.set_nonblocking(true)?;
        log::info!("Server listening on Unix socket {}", path.display());

        let shared = self.shared.clone();
        let thread = thread::spawn(move || unix_accept_loop(listener, shared));
        log::info!(
            "Ready to receive queries ({} worker threads)",
            rayon::current_num_threads()
        );

        Ok(ServerHandle {
            addr: None,
            socket_path: Some(path.to_path_buf()),
            running: Arc::clone(&self.shared.running),
            thread: Some(thread),
        })
    }
}

/// Handle to a running accept loop. Stopping (or dropping) the handle
/// shuts the loop down; in-flight connections finish on their own threads.
pub struct ServerHandle {
    addr: Option<SocketAddr>,
    socket_path: Option<PathBuf>,
    running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Bound TCP address, when serving TCP.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    /// Signal shutdown and wait for the accept loop to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        if let Some(path) = self.socket_path.take() {
            let _ = std::fs::remove_file(path);
        }
    }

    /// Block until the accept loop exits (normally only on `stop` from
    /// another handle or thread).
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tcp_accept_loop(listener: TcpListener, shared: Shared) {
    while shared.running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                let _ = stream.set_nonblocking(false);
                let _ = stream.set_read_timeout(Some(READ_TIMEOUT));
                spawn_connection(stream, &shared);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                log::error!("Accept error: {e}");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

fn unix_accept_loop(listener: UnixListener, shared: Shared) {
    while shared.running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                let _ = stream.set_nonblocking(false);
                let _ = stream.set_read_timeout(Some(READ_TIMEOUT));
                spawn_connection(stream, &shared);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                log::error!("Accept error: {e}");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

fn spawn_connection<S>(stream: S, shared: &Shared)
where
    S: Read + Write + Send + 'static,
{
    if shared.connections.load(Ordering::SeqCst) >= MAX_CONNECTIONS {
        log::warn!("Connection limit reached, rejecting");
        return;
    }
    shared.connections.fetch_add(1, Ordering::SeqCst);

    let shared = shared.clone();
    thread::spawn(move || {
        handle_connection(stream, &shared);
        shared.connections.fetch_sub(1, Ordering::SeqCst);
    });
}

fn handle_connection<S: Read + Write>(mut stream: S, shared: &Shared) {
    let mut ctx = MatchContext::for_catalog(&shared.catalog);
    let mut buffer: Vec<u8> = Vec::with_capacity(65536);
    let mut read_buf = [0u8; 8192];

    while shared.running.load(Ordering::SeqCst) {
        let n = match stream.read(&mut read_buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => break,
        };
        buffer.extend_from_slice(&read_buf[..n]);

        let mut start = 0usize;
        while start < buffer.len() {
            while start < buffer.len() && buffer[start].is_ascii_whitespace() {
                start += 1;
            }
            if start >= buffer.len() {
                break;
            }

            if buffer[start] != b'{' {
                // Garbage between objects: resync on the next brace.
                match buffer[start..].iter().position(|&b| b == b'{') {
                    Some(offset) => start += offset,
                    None => {
                        start = buffer.len();
                        break;
                    }
                }
            }

            let Some(end) = find_json_end(&buffer, start) else {
                // Incomplete object: keep it buffered until more arrives.
                break;
            };

            let json = String::from_utf8_lossy(&buffer[start..=end]).into_owned();
            let mut response = process_request(&shared.catalog, &shared.options, &json, &mut ctx);
            response.push('\n');
            if stream.write_all(response.as_bytes()).is_err() {
                return;
            }

            start = end + 1;
        }

        buffer.drain(..start);
    }
}

/// Answer one framed request. Exposed within the crate so integration
/// points can exercise the protocol without sockets.
pub(crate) fn process_request(
    catalog: &PatternCatalog,
    options: &MatchOptions,
    json: &str,
    ctx: &mut MatchContext,
) -> String {
    let (id, queries, batch) = match parse_request(json) {
        ParsedRequest::Invalid { id, error } => {
            return to_json(&ErrorResponse {
                id,
                status: 400,
                error,
            })
        }
        ParsedRequest::Valid { id, queries, batch } => (id, queries, batch),
    };

    if queries.is_empty() {
        return to_json(&ErrorResponse {
            id,
            status: 400,
            error: "No queries provided".to_string(),
        });
    }

    if batch {
        let results: Vec<BatchEntry> = queries
            .par_iter()
            .enumerate()
            .map_init(
                || MatchContext::for_catalog(catalog),
                |worker_ctx, (index, query)| {
                    let matches = match_input(catalog, query, options, worker_ctx);
                    BatchEntry {
                        index,
                        matches: matches.iter().map(MatchObject::from_record).collect(),
                    }
                },
            )
            .collect();

        let status = if results.iter().any(|r| !r.matches.is_empty()) {
            200
        } else {
            404
        };
        to_json(&BatchResponse {
            id,
            status,
            results,
        })
    } else {
        let matches = match_input(catalog, &queries[0], options, ctx);
        let results: Vec<MatchObject> = matches.iter().map(MatchObject::from_record).collect();
        let status = if results.is_empty() { 404 } else { 200 };
        to_json(&SingleResponse {
            id,
            status,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::logger::NullLogger;

    fn test_catalog() -> Arc<PatternCatalog> {
        let mut builder = CatalogBuilder::new(MatchOptions::new());
        builder.add_record("cnn com politics\tNP001\tnews_politics\t1", &NullLogger);
        builder.add_record("espn com\tNS001\tnews_sports\t2", &NullLogger);
        Arc::new(builder.seal())
    }

    fn respond(json: &str) -> serde_json::Value {
        let catalog = test_catalog();
        let options = MatchOptions::new().with_matching(true);
        let mut ctx = MatchContext::for_catalog(&catalog);
        let response = process_request(&catalog, &options, json, &mut ctx);
        serde_json::from_str(&response).unwrap()
    }

    #[test]
    fn test_single_query_hit() {
        let response = respond(r#"{"id": "r1", "query": "https://cnn.com/politics/x"}"#);

        assert_eq!(response["id"], "r1");
        assert_eq!(response["status"], 200);
        let results = response["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["category"], "news_politics");
        assert_eq!(results[0]["id"], "NP001");
        assert_eq!(results[0]["pattern"], "cnn com politics");
        assert_eq!(results[0]["match"], "cnn.com/politics");
    }

    #[test]
    fn test_single_query_miss_is_404() {
        let response = respond(r#"{"id": "r2", "query": "nothing here"}"#);
        assert_eq!(response["status"], 404);
        assert!(response["results"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_batch_query() {
        let response =
            respond(r#"{"id": "b1", "queries": ["espn.com/nba", "no match", "cnn.com/politics"]}"#);

        assert_eq!(response["status"], 200);
        let results = response["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["index"], 0);
        assert_eq!(results[0]["matches"][0]["id"], "NS001");
        assert!(results[1]["matches"].as_array().unwrap().is_empty());
        assert_eq!(results[2]["matches"][0]["id"], "NP001");
    }

    #[test]
    fn test_batch_with_no_hits_is_404() {
        let response = respond(r#"{"id": "b2", "queries": ["xxx", "yyy"]}"#);
        assert_eq!(response["status"], 404);
    }

    #[test]
    fn test_error_responses() {
        let response = respond(r#"{"query": "cnn.com"}"#);
        assert_eq!(response["id"], "unknown");
        assert_eq!(response["status"], 400);

        let response = respond(r#"{"id": "e1"}"#);
        assert_eq!(response["id"], "e1");
        assert_eq!(response["status"], 400);

        let response = respond(r#"{"id": "e2", "queries": []}"#);
        assert_eq!(response["status"], 400);
        assert_eq!(response["error"], "No queries provided");
    }
}
