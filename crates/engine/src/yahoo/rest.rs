use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Error, MarketDataSource, PriceBar, PriceSeries, Result};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) sma-scanner/0.1";

/// Characters of an error body kept in debug logs.
const MAX_LOGGED_BODY: usize = 512;

/// REST client for the Yahoo Finance chart API. Used to download daily closes.
pub struct YahooClient {
    base_url: String,
    http: Client,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn chart_url(&self, ticker: &str, period1: i64, period2: i64) -> String {
        format!(
            "{}/v8/finance/chart/{ticker}?period1={period1}&period2={period2}&interval=1d&events=history",
            self.base_url
        )
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_daily_closes(&self, ticker: &str, lookback_days: u32) -> Result<PriceSeries> {
        // Only completed sessions: the window ends at the start of today (UTC).
        let today = Utc::now().date_naive();
        let end = today.and_time(chrono::NaiveTime::MIN).and_utc();
        let start = end
            .checked_sub_signed(chrono::Duration::days(i64::from(lookback_days)))
            .ok_or_else(|| {
                Error::DataSource(format!(
                    "{ticker}: lookback of {lookback_days} days is out of range"
                ))
            })?;
        let url = self.chart_url(ticker, start.timestamp(), end.timestamp());

        debug!(ticker, lookback_days, "Downloading daily history");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        // Yahoo reports unknown symbols as 404 with a JSON error body.
        if !status.is_success() {
            if let Ok(parsed) = serde_json::from_str::<ChartEnvelope>(&body) {
                if let Some(err) = parsed.chart.error {
                    return Err(Error::DataSource(format!(
                        "{ticker}: {} ({})",
                        err.description, err.code
                    )));
                }
            }
            let snippet: String = body.chars().take(MAX_LOGGED_BODY).collect();
            debug!(ticker, %status, body = %snippet, "Chart request failed");
            return Err(Error::Http(format!("HTTP {status}")));
        }

        Ok(completed_sessions(parse_chart(ticker, &body)?, today))
    }
}

/// Convert a chart API body into a `PriceSeries`.
///
/// Rows with a null close (halted or partial sessions) are skipped. Dates are
/// taken in the exchange's local time using the reported GMT offset.
pub fn parse_chart(ticker: &str, body: &str) -> Result<PriceSeries> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(err) = envelope.chart.error {
        return Err(Error::DataSource(format!(
            "{ticker}: {} ({})",
            err.description, err.code
        )));
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| Error::DataSource(format!("{ticker}: empty chart response")))?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();
    let offset = result.meta.gmtoffset.unwrap_or(0);

    let bars: Vec<PriceBar> = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close = close?;
            let date = DateTime::from_timestamp(ts.checked_add(offset)?, 0)?.date_naive();
            Some(PriceBar::new(date, close))
        })
        .collect();

    if bars.is_empty() {
        return Err(Error::DataSource(format!("{ticker}: no price data returned")));
    }
    Ok(PriceSeries::new(ticker, bars))
}

/// Drop bars dated `today` or later. The provider may append the live
/// session even when the requested window ends earlier.
pub fn completed_sessions(series: PriceSeries, today: NaiveDate) -> PriceSeries {
    let ticker = series.ticker.clone();
    PriceSeries::new(
        ticker,
        series.bars().iter().copied().filter(|b| b.date < today),
    )
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
