use std::future::Future;
use std::sync::Arc;

use chrono::Local;
use tracing::{error, info, warn};

use common::{ReportSink, ScanSummary};
use strategy::Scanner;

use crate::schedule::{is_market_day, DailySchedule};

/// Drives scans and hands each summary to the configured sinks.
///
/// Holds no mutable state: every run fetches fresh data and the summary only
/// lives until the sinks have seen it.
pub struct Runner {
    scanner: Scanner,
    sinks: Vec<Arc<dyn ReportSink>>,
}

impl Runner {
    pub fn new(scanner: Scanner) -> Self {
        Self {
            scanner,
            sinks: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Scan once and deliver the result.
    pub async fn run_once(&self) -> ScanSummary {
        let cfg = self.scanner.config();
        info!(
            tickers = cfg.tickers.len(),
            sma_period = cfg.sma_period,
            threshold = cfg.dispersion_threshold,
            "Running scan"
        );

        let summary = self.scanner.scan().await;
        self.deliver(&summary).await;

        info!(
            opportunities = summary.total_opportunities(),
            "Scan finished. Found {} opportunities.",
            summary.total_opportunities()
        );
        summary
    }

    /// Like `run_once`, but skips weekends (market closed).
    pub async fn run_market_day(&self) -> Option<ScanSummary> {
        let today = Local::now().date_naive();
        if !is_market_day(today) {
            info!(%today, "Scan skipped: market is closed on weekends");
            return None;
        }
        Some(self.run_once().await)
    }

    /// Run at every scheduled time until `shutdown` resolves.
    ///
    /// Shutdown may interrupt a scan in progress; nothing is persisted, so
    /// dropping the partial run is safe.
    pub async fn run_scheduled<F>(&self, schedule: DailySchedule, run_now: bool, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(at = %schedule.at, "Scheduler started (Monday-Friday only)");

        if run_now {
            info!("Running initial scan immediately");
            tokio::select! {
                _ = self.run_market_day() => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, scheduler stopped");
                    return;
                }
            }
        }

        loop {
            let now = Local::now().naive_local();
            let next = schedule.next_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_run = %next, "Waiting for next scheduled scan");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    info!("Scheduled scan started");
                    tokio::select! {
                        _ = self.run_market_day() => {}
                        _ = &mut shutdown => break,
                    }
                }
                _ = &mut shutdown => break,
            }
        }
        info!("Shutdown requested, scheduler stopped");
    }

    async fn deliver(&self, summary: &ScanSummary) {
        for sink in &self.sinks {
            if !sink.wants(summary) {
                info!(sink = sink.name(), "No opportunities detected, skipping sink");
                continue;
            }
            match sink.deliver(summary).await {
                Ok(()) => info!(sink = sink.name(), "Report delivered"),
                Err(e) => error!(sink = sink.name(), error = %e, "Report delivery failed"),
            }
        }
        if summary.tickers_analyzed() == 0 {
            warn!("No ticker produced a signal in this run");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, NaiveTime};
    use common::{Error, PriceBar, Result};
    use paper::ReplaySource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use strategy::ScanConfig;

    #[derive(Default)]
    struct CountingSink {
        always: bool,
        fail: bool,
        delivered: AtomicUsize,
    }

    #[async_trait]
    impl ReportSink for CountingSink {
        fn name(&self) -> &str {
            "counting"
        }

        fn wants(&self, summary: &ScanSummary) -> bool {
            self.always || summary.total_opportunities() > 0
        }

        async fn deliver(&self, _summary: &ScanSummary) -> Result<()> {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Notify("unreachable".into()));
            }
            Ok(())
        }
    }

    fn scanner(last_close: f64) -> Scanner {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let mut closes = vec![100.0; 3];
        closes.push(last_close);
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(start + Duration::days(i as i64), c))
            .collect();

        let mut source = ReplaySource::new();
        source.insert("AAPL", bars);
        let cfg = ScanConfig {
            tickers: vec!["AAPL".into()],
            sma_period: 4,
            dispersion_threshold: 15.0,
            lookback_days: 30,
            max_concurrent_fetches: 1,
        };
        Scanner::new(Arc::new(source), Arc::new(cfg))
    }

    #[tokio::test]
    async fn alert_sinks_skip_runs_without_opportunities() {
        let alert = Arc::new(CountingSink::default());
        let console = Arc::new(CountingSink {
            always: true,
            ..Default::default()
        });
        let runner = Runner::new(scanner(100.0))
            .with_sink(alert.clone())
            .with_sink(console.clone());

        let summary = runner.run_once().await;

        assert_eq!(summary.total_opportunities(), 0);
        assert_eq!(alert.delivered.load(Ordering::SeqCst), 0);
        assert_eq!(console.delivered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn opportunities_reach_every_sink_even_if_one_fails() {
        let failing = Arc::new(CountingSink {
            fail: true,
            ..Default::default()
        });
        let ok = Arc::new(CountingSink::default());
        let runner = Runner::new(scanner(40.0))
            .with_sink(failing.clone())
            .with_sink(ok.clone());

        let summary = runner.run_once().await;

        assert_eq!(summary.buy_opportunities.len(), 1);
        assert_eq!(failing.delivered.load(Ordering::SeqCst), 1);
        assert_eq!(ok.delivered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn scheduler_stops_on_shutdown() {
        let runner = Runner::new(scanner(100.0));
        let schedule = DailySchedule::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        // Resolves immediately; the loop must exit instead of waiting for 09:00.
        runner
            .run_scheduled(schedule, false, std::future::ready(()))
            .await;
    }
}
