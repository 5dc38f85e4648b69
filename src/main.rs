//! Ripple-Lexicon main entry point
//!
//! This is the command-line interface for the Ripple-Lexicon word-frequency crawler.

use anyhow::Context;
use clap::Parser;
use ripple_lexicon::config::{load_config, validate, Config};
use ripple_lexicon::crawler::analyze;
use ripple_lexicon::output::{print_statistics, JsonReportWriter, ReportSink};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Ripple-Lexicon: A polite word-frequency crawler
///
/// Ripple-Lexicon fetches a list of articles from one site while respecting
/// its robots.txt and crawl delay, extracts the editorial text, and reports
/// the most frequent dictionary words as JSON.
#[derive(Parser, Debug)]
#[command(name = "ripple-lexicon")]
#[command(version = "1.0.0")]
#[command(about = "A polite word-frequency crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// File with one URL per line
    #[arg(long, value_name = "FILE")]
    urls_file: Option<PathBuf>,

    /// File with one valid word per line
    #[arg(long, value_name = "FILE")]
    wordbank_file: Option<PathBuf>,

    /// Total number of pipeline workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Requests per second (0 = use robots.txt Crawl-Delay, else unlimited)
    #[arg(long)]
    rate_limit: Option<f64>,

    /// Target site; robots.txt is loaded from its origin
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Number of top words to report
    #[arg(long)]
    top: Option<usize>,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line values on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(urls_file) = &self.urls_file {
            config.input.urls_file = Some(urls_file.clone());
        }
        if let Some(wordbank_file) = &self.wordbank_file {
            config.input.wordbank_file = Some(wordbank_file.clone());
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(rate_limit) = self.rate_limit {
            config.crawler.rate_limit = rate_limit;
        }
        if let Some(base_url) = &self.base_url {
            config.site.base_url = Some(base_url.clone());
        }
        if let Some(top) = self.top {
            config.output.top_words = top;
        }
        if let Some(output) = &self.output {
            config.output.report_path = Some(output.clone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let report = analyze(&config, cancel).await.context("Analysis failed")?;

    JsonReportWriter::new(config.output.report_path.clone())
        .write_report(&report)
        .context("Failed to write report")?;

    if !cli.quiet {
        print_statistics(&report);
    }

    if report.cancelled {
        tracing::warn!("Run was interrupted; the report is partial");
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so the JSON report on stdout stays clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_lexicon=info,warn"),
            1 => EnvFilter::new("ripple_lexicon=debug,info"),
            2 => EnvFilter::new("ripple_lexicon=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels the run on Ctrl-C or SIGTERM
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::warn!("Shutdown requested, finishing with partial results...");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = wait_for_ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!("Cannot listen for SIGTERM: {}", e);
            wait_for_ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    wait_for_ctrl_c().await;
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
