use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use tracing::{debug, info};

use common::{Error, MarketDataSource, PriceBar, PriceSeries, Result};

/// Market data source that replays stored price history instead of calling
/// a provider.
///
/// Used for offline runs (`--replay prices.json`) and as the scanner's test
/// double. The lookback window is applied relative to the latest stored bar
/// of each ticker, so replays are reproducible regardless of today's date.
#[derive(Debug, Default)]
pub struct ReplaySource {
    series: HashMap<String, Vec<PriceBar>>,
    /// Tickers forced to fail, with the error message to report.
    failures: HashMap<String, String>,
    /// Simulated response latency per ticker.
    delays: HashMap<String, Duration>,
}

impl ReplaySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON object of `{ "TICKER": [{"date": "YYYY-MM-DD", "close": 1.0}, ...] }`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let source = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            tickers = source.series.len(),
            "ReplaySource loaded"
        );
        Ok(source)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<PriceBar>> = serde_json::from_str(content)?;
        let mut source = Self::new();
        for (ticker, bars) in raw {
            source.insert(&ticker, bars);
        }
        Ok(source)
    }

    /// Store (or replace) the history for `ticker`.
    pub fn insert(&mut self, ticker: &str, bars: Vec<PriceBar>) {
        self.series.insert(ticker.trim().to_uppercase(), bars);
    }

    /// Make every fetch of `ticker` fail with `message`.
    pub fn fail(&mut self, ticker: &str, message: impl Into<String>) {
        self.failures
            .insert(ticker.trim().to_uppercase(), message.into());
    }

    /// Delay every fetch of `ticker` by `delay`.
    pub fn set_delay(&mut self, ticker: &str, delay: Duration) {
        self.delays.insert(ticker.trim().to_uppercase(), delay);
    }

}

#[async_trait]
impl MarketDataSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn fetch_daily_closes(&self, ticker: &str, lookback_days: u32) -> Result<PriceSeries> {
        let key = ticker.trim().to_uppercase();

        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(message) = self.failures.get(&key) {
            return Err(Error::DataSource(format!("{ticker}: {message}")));
        }

        let bars = self.series.get(&key).ok_or_else(|| {
            Error::DataSource(format!("ReplaySource has no price history for '{ticker}'"))
        })?;

        let series = PriceSeries::new(key, bars.iter().copied());
        let Some(latest) = series.last().map(|b| b.date) else {
            return Ok(series);
        };
        let cutoff = latest
            .checked_sub_signed(ChronoDuration::days(i64::from(lookback_days)))
            .ok_or_else(|| {
                Error::DataSource(format!(
                    "{ticker}: lookback of {lookback_days} days is out of range"
                ))
            })?;
        let windowed = PriceSeries::new(
            series.ticker.clone(),
            series.bars().iter().copied().filter(|b| b.date >= cutoff),
        );

        debug!(
            ticker,
            rows = windowed.len(),
            lookback_days,
            "Replayed price history"
        );
        Ok(windowed)
    }
}
