use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Chronologically ordered daily closes for a single ticker.
///
/// Construction sorts by date, keeps the last bar seen for a duplicated date
/// and drops non-finite closes, so consumers can rely on `closes()` being
/// strictly date-ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, bars: impl IntoIterator<Item = PriceBar>) -> Self {
        let mut bars: Vec<PriceBar> = bars.into_iter().filter(|b| b.close.is_finite()).collect();
        // Stable sort keeps arrival order within a date, so the last one wins below.
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(prev) if prev.date == bar.date => *prev = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            ticker: ticker.into(),
            bars: deduped,
        }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Close prices, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Classification of a ticker's dispersion against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

/// Outcome of analysing one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Ok,
    InsufficientData,
    FetchError,
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisStatus::Ok => write!(f, "OK"),
            AnalysisStatus::InsufficientData => write!(f, "INSUFFICIENT_DATA"),
            AnalysisStatus::FetchError => write!(f, "FETCH_ERROR"),
        }
    }
}

/// Per-ticker result of a scan.
///
/// `sma`, `dispersion_pct` and `signal` are `Some` if and only if
/// `status == AnalysisStatus::Ok`. Use the constructors to keep that true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ticker: String,
    pub status: AnalysisStatus,
    /// Date of the most recent bar, when any bar was available.
    pub as_of: Option<NaiveDate>,
    pub last_price: Option<f64>,
    pub sma: Option<f64>,
    /// Unrounded signed deviation of `last_price` from `sma`, in percent.
    pub dispersion_pct: Option<f64>,
    pub signal: Option<Signal>,
    /// Reason for a non-OK status.
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn ok(
        ticker: impl Into<String>,
        as_of: NaiveDate,
        last_price: f64,
        sma: f64,
        dispersion_pct: f64,
        signal: Signal,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            status: AnalysisStatus::Ok,
            as_of: Some(as_of),
            last_price: Some(last_price),
            sma: Some(sma),
            dispersion_pct: Some(dispersion_pct),
            signal: Some(signal),
            error: None,
        }
    }

    pub fn insufficient_data(
        ticker: impl Into<String>,
        last: Option<&PriceBar>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            status: AnalysisStatus::InsufficientData,
            as_of: last.map(|b| b.date),
            last_price: last.map(|b| b.close),
            sma: None,
            dispersion_pct: None,
            signal: None,
            error: Some(reason.into()),
        }
    }

    pub fn fetch_error(ticker: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            status: AnalysisStatus::FetchError,
            as_of: None,
            last_price: None,
            sma: None,
            dispersion_pct: None,
            signal: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == AnalysisStatus::Ok
    }

    /// Dispersion rounded to two decimals, for display only.
    pub fn dispersion_display(&self) -> Option<f64> {
        self.dispersion_pct.map(round2)
    }
}

/// Aggregated output of one scan, in configured ticker order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub scanned_at: DateTime<Utc>,
    pub sma_period: usize,
    pub dispersion_threshold: f64,
    pub results: Vec<AnalysisResult>,
    pub buy_opportunities: Vec<AnalysisResult>,
    pub sell_opportunities: Vec<AnalysisResult>,
}

impl ScanSummary {
    /// Split `results` into BUY/SELL lists, preserving their order.
    pub fn from_results(
        results: Vec<AnalysisResult>,
        sma_period: usize,
        dispersion_threshold: f64,
        scanned_at: DateTime<Utc>,
    ) -> Self {
        let with_signal = |wanted: Signal| -> Vec<AnalysisResult> {
            results
                .iter()
                .filter(|r| r.signal == Some(wanted))
                .cloned()
                .collect()
        };
        let buy_opportunities = with_signal(Signal::Buy);
        let sell_opportunities = with_signal(Signal::Sell);

        Self {
            scanned_at,
            sma_period,
            dispersion_threshold,
            results,
            buy_opportunities,
            sell_opportunities,
        }
    }

    /// Number of tickers that produced a signal.
    pub fn tickers_analyzed(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn total_opportunities(&self) -> usize {
        self.buy_opportunities.len() + self.sell_opportunities.len()
    }

    pub fn failed(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.results.iter().filter(|r| !r.is_ok())
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn series_is_sorted_and_deduplicated() {
        let series = PriceSeries::new(
            "AAPL",
            vec![
                PriceBar::new(day(3), 3.0),
                PriceBar::new(day(1), 1.0),
                PriceBar::new(day(2), 2.0),
                PriceBar::new(day(2), 2.5),
            ],
        );
        assert_eq!(series.closes(), vec![1.0, 2.5, 3.0]);
        assert_eq!(series.last().unwrap().date, day(3));
    }

    #[test]
    fn series_drops_non_finite_closes() {
        let series = PriceSeries::new(
            "AAPL",
            vec![PriceBar::new(day(1), f64::NAN), PriceBar::new(day(2), 10.0)],
        );
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn summary_lists_keep_ticker_order() {
        let results = vec![
            AnalysisResult::ok("B", day(1), 80.0, 100.0, -20.0, Signal::Buy),
            AnalysisResult::ok("S", day(1), 130.0, 100.0, 30.0, Signal::Sell),
            AnalysisResult::fetch_error("X", "boom"),
            AnalysisResult::ok("A", day(1), 70.0, 100.0, -30.0, Signal::Buy),
            AnalysisResult::ok("H", day(1), 100.0, 100.0, 0.0, Signal::Hold),
        ];
        let summary = ScanSummary::from_results(results, 29, 15.0, Utc::now());

        let buys: Vec<&str> = summary.buy_opportunities.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(buys, vec!["B", "A"]);
        assert_eq!(summary.sell_opportunities.len(), 1);
        assert_eq!(summary.tickers_analyzed(), 4);
        assert_eq!(summary.total_opportunities(), 3);
        assert_eq!(summary.failed().count(), 1);
    }

    #[test]
    fn non_ok_results_carry_no_signal() {
        let r = AnalysisResult::insufficient_data("AAPL", None, "need 29 closes, got 3");
        assert!(r.signal.is_none() && r.sma.is_none() && r.dispersion_pct.is_none());
        let r = AnalysisResult::fetch_error("AAPL", "timeout");
        assert!(r.signal.is_none() && r.sma.is_none());
    }

    #[test]
    fn signal_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        assert_eq!(
            serde_json::to_string(&AnalysisStatus::InsufficientData).unwrap(),
            "\"INSUFFICIENT_DATA\""
        );
    }

    #[test]
    fn dispersion_display_rounds_two_decimals() {
        let r = AnalysisResult::ok("A", day(1), 100.0, 120.0, -16.666_666, Signal::Buy);
        assert_eq!(r.dispersion_display(), Some(-16.67));
    }
}
