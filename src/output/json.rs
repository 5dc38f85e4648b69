//! JSON report writer

use super::traits::{OutputResult, Report, ReportSink};
use std::io::Write;
use std::path::PathBuf;

/// Writes the report as pretty-printed JSON to stdout or a file
#[derive(Debug, Clone, Default)]
pub struct JsonReportWriter {
    path: Option<PathBuf>,
}

impl JsonReportWriter {
    /// Writes to `path` when given, otherwise to stdout
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Renders the report without writing it
    pub fn render(report: &Report) -> OutputResult<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}

impl ReportSink for JsonReportWriter {
    fn write_report(&self, report: &Report) -> OutputResult<()> {
        let json = Self::render(report)?;

        match &self.path {
            Some(path) => {
                std::fs::write(path, json)?;
                tracing::info!("Report written to {}", path.display());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", json)?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}
