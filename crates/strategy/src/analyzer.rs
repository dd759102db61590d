use common::{AnalysisResult, PriceSeries};

use crate::indicators::DispersionIndicator;

/// Turn one ticker's price history into an `AnalysisResult`.
///
/// Pure: no I/O, no logging. A series shorter than `sma_period`, a zero
/// period, or a zero average all yield `INSUFFICIENT_DATA` with no signal.
pub fn analyze(series: &PriceSeries, sma_period: usize, dispersion_threshold: f64) -> AnalysisResult {
    let ticker = series.ticker.as_str();
    let last = series.last();

    if sma_period == 0 {
        return AnalysisResult::insufficient_data(ticker, last, "sma_period must be >= 1");
    }

    let closes = series.closes();
    if closes.len() < sma_period {
        return AnalysisResult::insufficient_data(
            ticker,
            last,
            format!("need {sma_period} closes, got {}", closes.len()),
        );
    }

    let indicator = DispersionIndicator::new(sma_period, dispersion_threshold);
    match (indicator.compute(&closes), last) {
        (Some(reading), Some(bar)) => AnalysisResult::ok(
            ticker,
            bar.date,
            reading.last_price,
            reading.sma,
            reading.dispersion_pct,
            reading.signal,
        ),
        (None, _) => AnalysisResult::insufficient_data(ticker, last, "moving average is zero"),
        (Some(_), None) => AnalysisResult::insufficient_data(ticker, None, "empty series"),
    }
}
