use async_trait::async_trait;

use crate::{Result, ScanSummary};

/// Destination for a finished scan (chat alert, console, ...).
///
/// The scanner's obligation ends at producing the `ScanSummary`; rendering
/// and delivery are entirely the sink's concern.
#[async_trait]
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this summary should be delivered at all.
    /// Alerting sinks only fire when there is something to act on.
    fn wants(&self, summary: &ScanSummary) -> bool {
        summary.total_opportunities() > 0
    }

    async fn deliver(&self, summary: &ScanSummary) -> Result<()>;
}
