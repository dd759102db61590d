use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use common::{AnalysisResult, AnalysisStatus, MarketDataSource, ScanSummary};

use crate::analyzer::analyze;
use crate::config::ScanConfig;

/// Applies the dispersion analysis to every configured ticker.
///
/// Holds only immutable state; cloning is cheap and a single scanner may
/// run scans from several tasks.
#[derive(Clone)]
pub struct Scanner {
    source: Arc<dyn MarketDataSource>,
    config: Arc<ScanConfig>,
}

impl Scanner {
    pub fn new(source: Arc<dyn MarketDataSource>, config: Arc<ScanConfig>) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub async fn scan(&self) -> ScanSummary {
        scan(self.source.as_ref(), &self.config).await
    }
}

/// Fetch and analyse every ticker in `config`, returning results in
/// configured order.
///
/// Up to `max_concurrent_fetches` fetches are in flight at once; output
/// order never depends on completion order. A failing ticker is recorded as
/// `FETCH_ERROR` and never affects the others.
pub async fn scan(source: &dyn MarketDataSource, config: &ScanConfig) -> ScanSummary {
    let total = config.tickers.len();
    info!(
        tickers = total,
        sma_period = config.sma_period,
        threshold = config.dispersion_threshold,
        source = source.name(),
        "Starting scan"
    );

    let results: Vec<AnalysisResult> = stream::iter(config.tickers.iter().enumerate())
        .map(|(i, ticker)| scan_ticker(source, config, ticker, i + 1, total))
        .buffered(config.max_concurrent_fetches.max(1))
        .collect()
        .await;

    let summary = ScanSummary::from_results(
        results,
        config.sma_period,
        config.dispersion_threshold,
        Utc::now(),
    );

    if summary.tickers_analyzed() == 0 {
        warn!("No data retrieved for any ticker");
    }
    info!(
        analyzed = summary.tickers_analyzed(),
        buy = summary.buy_opportunities.len(),
        sell = summary.sell_opportunities.len(),
        "Scan completed"
    );
    summary
}

async fn scan_ticker(
    source: &dyn MarketDataSource,
    config: &ScanConfig,
    ticker: &str,
    index: usize,
    total: usize,
) -> AnalysisResult {
    info!("Processing {ticker} ({index}/{total})");

    let series = match source.fetch_daily_closes(ticker, config.lookback_days).await {
        Ok(series) => series,
        Err(e) => {
            warn!(ticker, error = %e, "Fetch failed, skipping ticker");
            return AnalysisResult::fetch_error(ticker, e.to_string());
        }
    };

    let mut result = analyze(&series, config.sma_period, config.dispersion_threshold);
    result.ticker = ticker.to_string();

    match result.status {
        AnalysisStatus::InsufficientData => warn!(
            ticker,
            rows = series.len(),
            need = config.sma_period,
            "Insufficient data"
        ),
        _ => debug!(
            ticker,
            dispersion = ?result.dispersion_display(),
            signal = ?result.signal,
            "Ticker analyzed"
        ),
    }
    result
}
