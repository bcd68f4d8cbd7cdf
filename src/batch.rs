//! Batch matching pipeline for the command-line front end.
//!
//! Input lines are loaded up front, matched in parallel with one reusable
//! context per rayon worker, and written out sequentially so output order
//! follows input order. Each match becomes one tab-separated line:
//! `=` (or `*` for LCSS), the pattern's metadata, its display text, the
//! matched substring (or the 1-based line number when substring extraction
//! is off), and the original input line.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::catalog::PatternCatalog;
use crate::config::MatchOptions;
use crate::error::Result;
use crate::input::open_lines;
use crate::matcher::{match_input, MatchContext, MatchKind, MatchRecord};

/// Statistics from one batch run.
#[derive(Debug, Clone, Copy)]
pub struct BatchReport {
    pub lines: usize,
    pub matches: usize,
    pub elapsed: Duration,
}

impl BatchReport {
    /// Throughput, when the run was long enough to measure.
    pub fn strings_per_sec(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.lines as f64 / secs)
    }
}

/// Read every line of a (possibly gzip-compressed) input file.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let reader = open_lines(path)?;
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?);
    }
    Ok(lines)
}

/// Match every line and write the result rows to `out`.
///
/// With `verify` set, each reported substring is re-matched and a warning
/// is logged when the reporting pattern does not reproduce, a spot check
/// built on the property that every pattern matches its own text.
pub fn run_batch<W: Write>(
    catalog: &PatternCatalog,
    lines: &[String],
    options: &MatchOptions,
    verify: bool,
    out: &mut W,
) -> io::Result<BatchReport> {
    let start = Instant::now();

    let results: Vec<Vec<MatchRecord<'_, '_>>> = lines
        .par_iter()
        .map_init(
            || MatchContext::for_catalog(catalog),
            |ctx, line| match_input(catalog, line, options, ctx),
        )
        .collect();

    let elapsed = start.elapsed();

    let mut total = 0usize;
    let mut verify_ctx = if verify {
        Some(MatchContext::for_catalog(catalog))
    } else {
        None
    };

    for (index, (line, matches)) in lines.iter().zip(&results).enumerate() {
        for record in matches {
            total += 1;

            let marker = match record.kind {
                MatchKind::Exact => '=',
                MatchKind::Lcss => '*',
            };
            write!(out, "{marker}\t{}\t{}\t", record.metadata, record.display_text)?;
            match &record.span {
                Some(span) => out.write_all(span.text.as_bytes())?,
                None => write!(out, "{}", index + 1)?,
            }
            writeln!(out, "\t{line}")?;

            if let (Some(ctx), Some(span)) = (verify_ctx.as_mut(), &record.span) {
                let recheck = match_input(catalog, span.text, options, ctx);
                if !recheck.iter().any(|r| r.pattern_id == record.pattern_id) {
                    log::warn!(
                        "Verify failed: pattern {} not reproduced by '{}'",
                        record.pattern_id,
                        span.text
                    );
                }
            }
        }
    }

    Ok(BatchReport {
        lines: lines.len(),
        matches: total,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::logger::NullLogger;

    fn test_catalog() -> PatternCatalog {
        let mut builder = CatalogBuilder::new(MatchOptions::new());
        builder.add_record("cnn com politics\tNP001\tnews_politics", &NullLogger);
        builder.add_record("espn com\tNS001\tnews_sports", &NullLogger);
        builder.seal()
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_output_rows_with_substrings() {
        let catalog = test_catalog();
        let inputs = lines(&["https://cnn.com/politics/a", "nothing", "ESPN.com/nba"]);
        let options = MatchOptions::new().with_matching(true);

        let mut out = Vec::new();
        let report = run_batch(&catalog, &inputs, &options, false, &mut out).unwrap();

        assert_eq!(report.lines, 3);
        assert_eq!(report.matches, 2);

        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            "=\tNP001\tnews_politics\tcnn com politics\tcnn.com/politics\thttps://cnn.com/politics/a"
        );
        assert_eq!(
            rows[1],
            "=\tNS001\tnews_sports\tespn com\tESPN.com\tESPN.com/nba"
        );
    }

    #[test]
    fn test_line_numbers_without_matching_flag() {
        let catalog = test_catalog();
        let inputs = lines(&["x", "espn.com here"]);

        let mut out = Vec::new();
        run_batch(&catalog, &inputs, &MatchOptions::new(), false, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "=\tNS001\tnews_sports\tespn com\t2\tespn.com here"
        );
    }

    #[test]
    fn test_lcss_rows_use_star_marker() {
        let mut builder = CatalogBuilder::new(MatchOptions::new());
        builder.add_record("alpha beta gamma delta\tL1\tcat", &NullLogger);
        let catalog = builder.seal();

        let inputs = lines(&["alpha x beta x gamma"]);
        let options = MatchOptions::new().with_matching(true).with_lcss(true);

        let mut out = Vec::new();
        let report = run_batch(&catalog, &inputs, &options, false, &mut out).unwrap();

        assert_eq!(report.matches, 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with('*'), "LCSS rows lead with '*': {text}");
    }

    #[test]
    fn test_empty_input_set() {
        let catalog = test_catalog();
        let mut out = Vec::new();
        let report = run_batch(&catalog, &[], &MatchOptions::new(), false, &mut out).unwrap();
        assert_eq!(report.lines, 0);
        assert_eq!(report.matches, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_verify_pass_is_silent() {
        let catalog = test_catalog();
        let inputs = lines(&["cnn.com/politics"]);
        let options = MatchOptions::new().with_matching(true);

        let mut out = Vec::new();
        let report = run_batch(&catalog, &inputs, &options, true, &mut out).unwrap();
        assert_eq!(report.matches, 1);
    }
}
