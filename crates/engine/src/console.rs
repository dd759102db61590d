use async_trait::async_trait;

use common::{ReportSink, Result, ScanSummary};
use strategy::report::render_summary;

/// Prints the full report table to stdout after every scan.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

#[async_trait]
impl ReportSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn wants(&self, _summary: &ScanSummary) -> bool {
        true
    }

    async fn deliver(&self, summary: &ScanSummary) -> Result<()> {
        println!("{}", render_summary(summary));
        Ok(())
    }
}
