use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use std::time::Instant;

use anyhow::bail;
use clap::Parser;

use prefix_match::batch;
use prefix_match::cli::Cli;
use prefix_match::{CatalogBuilder, LogAdapter, Logger, NullLogger, Server};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    env_logger::Builder::from_env(env).init();

    if cli.port.is_some() && cli.socket.is_some() {
        bail!("Cannot specify both TCP port (-P) and Unix socket (-S)");
    }

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let options = cli.to_options();
    let logger: Box<dyn Logger> = if cli.logperf {
        Box::new(LogAdapter)
    } else {
        Box::new(NullLogger)
    };

    let mut builder = CatalogBuilder::new(options);
    if let Some(stopwords) = &cli.stopwords {
        builder.load_stopwords_file(stopwords, logger.as_ref())?;
    }

    let load_start = Instant::now();
    builder.load_patterns_file(&cli.patterns, logger.as_ref())?;
    let catalog = Arc::new(builder.seal());

    if !cli.quiet {
        eprintln!(
            "Loaded {} patterns in {}ms",
            catalog.pattern_count(),
            load_start.elapsed().as_millis()
        );
        eprintln!("Trie blocks: {}", catalog.block_count());
        eprintln!("Memory usage: {} KB", catalog.memory_usage() / 1024);
        eprintln!("Using {} threads", rayon::current_num_threads());
    }

    if let Some(port) = cli.port {
        let server = Server::new(Arc::clone(&catalog), options);
        let handle = server.start_tcp(port)?;
        handle.join();
        return Ok(());
    }

    if let Some(socket) = &cli.socket {
        let server = Server::new(Arc::clone(&catalog), options);
        let handle = server.start_unix(socket)?;
        handle.join();
        return Ok(());
    }

    if let Some(strings) = &cli.strings {
        let read_start = Instant::now();
        let lines = batch::read_lines(strings)?;
        if !cli.quiet {
            eprintln!(
                "Read {} lines in {}ms",
                lines.len(),
                read_start.elapsed().as_millis()
            );
        }

        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        let report = batch::run_batch(&catalog, &lines, &options, cli.verify, &mut out)?;
        out.flush()?;

        if !cli.quiet {
            eprintln!();
            eprintln!(
                "Processed {} strings in {}ms",
                report.lines,
                report.elapsed.as_millis()
            );
            eprintln!("Total matches: {}", report.matches);
            if let Some(rate) = report.strings_per_sec() {
                eprintln!("Throughput: {} strings/sec", rate as u64);
            }
        }
    } else {
        eprintln!("No string file (-s) or server mode (-P/-S) specified.");
        eprintln!("Pattern file loaded successfully. Use --help for usage.");
    }

    Ok(())
}
