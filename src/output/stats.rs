//! Human-readable run statistics
//!
//! Printed to stderr so that a JSON report on stdout stays machine-readable.

use super::traits::Report;
use std::fmt::Write;

/// Formats the final and parsing statistics of a run
pub fn render_statistics(report: &Report) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_statistics(&mut out, report);
    out
}

fn write_statistics(out: &mut String, report: &Report) -> std::fmt::Result {
    writeln!(out, "=== Final Statistics ===")?;
    writeln!(out, "  Articles processed: {}", report.total_items_processed)?;
    writeln!(out, "  Total words processed: {}", report.total_words_processed)?;
    writeln!(out, "  Unique words found: {}", report.unique_words)?;
    writeln!(out, "  Processing time: {:.1} seconds", report.processing_time_seconds)?;
    if report.total_items_processed > 0 && report.processing_time_seconds > 0.0 {
        let rate = report.total_items_processed as f64 / report.processing_time_seconds;
        writeln!(out, "  Processing rate: {:.1} articles/sec", rate)?;
    }
    writeln!(out)?;

    let errors = &report.errors;
    if errors.total() > 0 {
        writeln!(out, "Errors ({}):", errors.total())?;
        writeln!(out, "  Disallowed by robots.txt: {}", errors.policy_denied)?;
        writeln!(out, "  Fetch failures: {}", errors.fetch)?;
        writeln!(out, "  Extraction failures: {}", errors.extraction)?;
        writeln!(out, "  URL list failures: {}", errors.source)?;
        writeln!(out)?;
    }

    let failed = report.extraction_failures;
    let attempted = report.total_items_processed + failed;
    writeln!(out, "=== Parsing Statistics ===")?;
    writeln!(out, "  Successfully parsed articles: {}", report.total_items_processed)?;
    writeln!(out, "  Failed to parse articles: {}", failed)?;
    if attempted > 0 {
        let success_rate = report.total_items_processed as f64 / attempted as f64 * 100.0;
        writeln!(out, "  Success rate: {:.1}%", success_rate)?;
    }
    if failed > 0 {
        writeln!(
            out,
            "  Warning: {} articles had no content matching the configured selectors",
            failed
        )?;
    }

    if report.cancelled {
        writeln!(out)?;
        writeln!(out, "Run was interrupted; statistics cover completed articles only")?;
    }
    Ok(())
}

/// Prints statistics to stderr in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to summarize
pub fn print_statistics(report: &Report) {
    eprint!("{}", render_statistics(report));
}
