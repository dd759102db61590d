use serde::Serialize;

use crate::indicators::{dispersion_series, SmaIndicator};

/// Historical behaviour of a ticker's dispersion from its SMA.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispersionStats {
    pub mean_pct: f64,
    /// Sample standard deviation (n − 1). Zero when only one day is available.
    pub std_pct: f64,
    pub max_pct: f64,
    pub min_pct: f64,
    pub current_pct: f64,
    pub days_above_sma: usize,
    pub days_below_sma: usize,
    pub total_days: usize,
}

impl DispersionStats {
    pub fn pct_days_above(&self) -> f64 {
        self.days_above_sma as f64 / self.total_days as f64 * 100.0
    }

    pub fn pct_days_below(&self) -> f64 {
        self.days_below_sma as f64 / self.total_days as f64 * 100.0
    }
}

/// Statistics over the rolling dispersion series of `closes` (oldest first).
/// Returns `None` when fewer than `period` usable values exist.
pub fn dispersion_statistics(closes: &[f64], period: usize) -> Option<DispersionStats> {
    if period == 0 {
        return None;
    }
    let series = dispersion_series(&SmaIndicator::new(period), closes);
    let current_pct = *series.last()?;
    let n = series.len();

    let mean_pct = series.iter().sum::<f64>() / n as f64;
    let std_pct = if n > 1 {
        let var = series.iter().map(|d| (d - mean_pct).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };

    Some(DispersionStats {
        mean_pct,
        std_pct,
        max_pct: series.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min_pct: series.iter().copied().fold(f64::INFINITY, f64::min),
        current_pct,
        days_above_sma: series.iter().filter(|&&d| d > 0.0).count(),
        days_below_sma: series.iter().filter(|&&d| d < 0.0).count(),
        total_days: n,
    })
}
