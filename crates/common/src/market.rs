use async_trait::async_trait;

use crate::{PriceSeries, Result};

/// Abstraction over the daily price history provider.
///
/// `YahooClient` implements this against the public chart API.
/// `ReplaySource` implements this from memory or a JSON file.
///
/// Any `Err` returned here is recorded as a `FETCH_ERROR` for that ticker
/// only; the scanner never retries.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Fetch daily closes covering at least the last `lookback_days`
    /// calendar days, oldest first.
    async fn fetch_daily_closes(&self, ticker: &str, lookback_days: u32) -> Result<PriceSeries>;
}
