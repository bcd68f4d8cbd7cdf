//! Logging collaborator.
//!
//! The core reports ingestion progress and record rejections through a
//! narrow `Logger` trait rather than a concrete sink, so embedders can
//! route messages wherever they like. Three implementations ship here:
//! plain stdout/stderr, a silent null logger for benchmarks and quiet
//! batch runs, and an adapter onto the `log` facade for binaries that
//! initialize `env_logger`.

/// Message sink used during catalog construction.
///
/// Implementations must be safe to call from multiple threads; each call
/// carries one complete message.
pub trait Logger: Send + Sync {
    fn info(&self, msg: &str);
    fn warning(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Logger writing info to stdout and warnings/errors to stderr.
#[derive(Debug, Default)]
pub struct StdoutLogger;

impl Logger for StdoutLogger {
    fn info(&self, msg: &str) {
        println!("INFO: {msg}");
    }

    fn warning(&self, msg: &str) {
        eprintln!("WARNING: {msg}");
    }

    fn error(&self, msg: &str) {
        eprintln!("ERROR: {msg}");
    }
}

/// Logger that discards everything.
#[derive(Debug, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn info(&self, _msg: &str) {}
    fn warning(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// Adapter forwarding core messages to the `log` crate macros, for use
/// with `env_logger` or any other `log` backend.
#[derive(Debug, Default)]
pub struct LogAdapter;

impl Logger for LogAdapter {
    fn info(&self, msg: &str) {
        log::info!("{msg}");
    }

    fn warning(&self, msg: &str) {
        log::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        log::error!("{msg}");
    }
}
