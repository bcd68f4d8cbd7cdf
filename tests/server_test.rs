//! Socket-level round trips against a running server.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::time::Duration;

use prefix_match::{build_catalog, MatchOptions, NullLogger, PatternCatalog, Server};

fn test_catalog() -> Arc<PatternCatalog> {
    let source = "\
cnn com politics\tNP001\tnews_politics\t1
espn com\tNS001\tnews_sports\t2
";
    Arc::new(build_catalog(source.as_bytes(), &MatchOptions::new(), &NullLogger).unwrap())
}

fn read_response<R: BufRead>(reader: &mut R) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    serde_json::from_str(line.trim()).unwrap()
}

#[test]
fn test_tcp_single_query_round_trip() {
    let server = Server::new(test_catalog(), MatchOptions::new());
    let mut handle = server.start_tcp(0).unwrap();
    let addr = handle.local_addr().unwrap();

    let mut stream = TcpStream::connect(("127.0.0.1", addr.port())).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
        .write_all(br#"{"id": "q1", "query": "https://cnn.com/politics/x"}"#)
        .unwrap();

    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let response = read_response(&mut reader);

    assert_eq!(response["id"], "q1");
    assert_eq!(response["status"], 200);
    assert_eq!(response["results"][0]["id"], "NP001");
    assert_eq!(response["results"][0]["category"], "news_politics");
    // Server mode always extracts the span.
    assert_eq!(response["results"][0]["match"], "cnn.com/politics");

    handle.stop();
}

#[test]
fn test_tcp_request_split_across_writes() {
    let server = Server::new(test_catalog(), MatchOptions::new());
    let mut handle = server.start_tcp(0).unwrap();
    let addr = handle.local_addr().unwrap();

    let mut stream = TcpStream::connect(("127.0.0.1", addr.port())).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    // Two half-writes of one object, then a second object on its heels.
    stream.write_all(br#"{"id": "s1", "que"#).unwrap();
    stream.flush().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    stream
        .write_all(br#"ry": "espn.com"}{"id": "s2", "query": "none"}"#)
        .unwrap();

    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let first = read_response(&mut reader);
    let second = read_response(&mut reader);

    assert_eq!(first["id"], "s1");
    assert_eq!(first["status"], 200);
    assert_eq!(second["id"], "s2");
    assert_eq!(second["status"], 404);

    handle.stop();
}

#[test]
fn test_tcp_batch_and_error_responses() {
    let server = Server::new(test_catalog(), MatchOptions::new());
    let mut handle = server.start_tcp(0).unwrap();
    let addr = handle.local_addr().unwrap();

    let mut stream = TcpStream::connect(("127.0.0.1", addr.port())).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    stream
        .write_all(br#"{"id": "b1", "queries": ["espn.com/nba", "nothing"]}"#)
        .unwrap();
    let batch = read_response(&mut reader);
    assert_eq!(batch["status"], 200);
    assert_eq!(batch["results"][0]["index"], 0);
    assert_eq!(batch["results"][0]["matches"][0]["id"], "NS001");
    assert!(batch["results"][1]["matches"].as_array().unwrap().is_empty());

    stream.write_all(br#"{"query": "cnn.com"}"#).unwrap();
    let error = read_response(&mut reader);
    assert_eq!(error["id"], "unknown");
    assert_eq!(error["status"], 400);

    handle.stop();
}

#[test]
fn test_unix_socket_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("pm.sock");

    let server = Server::new(test_catalog(), MatchOptions::new());
    let mut handle = server.start_unix(&socket_path).unwrap();

    let mut stream = UnixStream::connect(&socket_path).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
        .write_all(br#"{"id": "u1", "query": "ESPN.COM/scores"}"#)
        .unwrap();

    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let response = read_response(&mut reader);

    assert_eq!(response["id"], "u1");
    assert_eq!(response["status"], 200);
    assert_eq!(response["results"][0]["match"], "ESPN.COM");

    handle.stop();
    assert!(!socket_path.exists(), "socket file removed on stop");
}
