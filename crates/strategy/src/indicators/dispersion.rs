use common::Signal;

use super::SmaIndicator;

/// Percentage dispersion of the latest close from its SMA, classified
/// against a symmetric threshold.
///
/// dispersion % = (last − SMA) / SMA × 100
///
/// At or below `-threshold` the ticker is a BUY, at or above `+threshold` a
/// SELL, HOLD in between. Both boundaries are inclusive.
#[derive(Debug, Clone, Copy)]
pub struct DispersionIndicator {
    pub sma: SmaIndicator,
    pub threshold: f64,
}

/// A single evaluation of the indicator on the latest bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispersionReading {
    pub last_price: f64,
    pub sma: f64,
    pub dispersion_pct: f64,
    pub signal: Signal,
}

impl DispersionIndicator {
    /// Panics if `sma_period` is zero. Any threshold is accepted; a negative
    /// one makes every reading BUY.
    pub fn new(sma_period: usize, threshold: f64) -> Self {
        Self {
            sma: SmaIndicator::new(sma_period),
            threshold,
        }
    }

    /// Evaluate on a slice of closes (oldest first).
    /// Returns `None` if there are fewer than `sma.period` values or the
    /// average is zero.
    pub fn compute(&self, closes: &[f64]) -> Option<DispersionReading> {
        let sma = self.sma.compute(closes)?;
        let last_price = *closes.last()?;
        let dispersion_pct = dispersion_pct(last_price, sma)?;
        Some(DispersionReading {
            last_price,
            sma,
            dispersion_pct,
            signal: classify(dispersion_pct, self.threshold),
        })
    }
}

/// Dispersion of every close against its rolling SMA, aligned to
/// `closes[period - 1..]`. Bars whose SMA is zero are skipped.
pub fn dispersion_series(sma: &SmaIndicator, closes: &[f64]) -> Vec<f64> {
    let offset = sma.period - 1;
    sma.series(closes)
        .into_iter()
        .enumerate()
        .filter_map(|(i, avg)| dispersion_pct(closes[i + offset], avg))
        .collect()
}

/// `(price − sma) / sma × 100`, or `None` when `sma` is zero.
pub fn dispersion_pct(price: f64, sma: f64) -> Option<f64> {
    if sma == 0.0 {
        return None;
    }
    Some((price - sma) / sma * 100.0)
}

/// Classify a dispersion against a symmetric threshold.
pub fn classify(dispersion_pct: f64, threshold: f64) -> Signal {
    if dispersion_pct <= -threshold {
        Signal::Buy
    } else if dispersion_pct >= threshold {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 28 equal closes followed by `last`, averaging exactly to `sma` (period 29).
    fn closes_with(sma: f64, last: f64) -> Vec<f64> {
        let filler = (sma * 29.0 - last) / 28.0;
        let mut v = vec![filler; 28];
        v.push(last);
        v
    }

    #[test]
    fn boundary_is_inclusive_on_both_sides() {
        assert_eq!(classify(-15.0, 15.0), Signal::Buy);
        assert_eq!(classify(15.0, 15.0), Signal::Sell);
        assert_eq!(classify(-14.999, 15.0), Signal::Hold);
        assert_eq!(classify(14.999, 15.0), Signal::Hold);
    }

    #[test]
    fn zero_threshold_never_holds_off_the_mean() {
        assert_eq!(classify(0.0, 0.0), Signal::Buy);
        assert_eq!(classify(0.01, 0.0), Signal::Sell);
    }

    #[test]
    fn price_below_sma_is_buy() {
        let ind = DispersionIndicator::new(29, 15.0);
        let r = ind.compute(&closes_with(120.0, 100.0)).unwrap();
        assert!((r.sma - 120.0).abs() < 1e-9);
        assert!((r.dispersion_pct - (-16.666_666_666)).abs() < 1e-6);
        assert_eq!(r.signal, Signal::Buy);
    }

    #[test]
    fn price_above_sma_is_sell() {
        let ind = DispersionIndicator::new(29, 15.0);
        let r = ind.compute(&closes_with(120.0, 140.0)).unwrap();
        assert!((r.dispersion_pct - 16.666_666_666).abs() < 1e-6);
        assert_eq!(r.signal, Signal::Sell);
    }

    #[test]
    fn small_deviation_is_hold() {
        let ind = DispersionIndicator::new(29, 15.0);
        let r = ind.compute(&closes_with(120.0, 110.0)).unwrap();
        assert!((r.dispersion_pct - (-8.333_333_333)).abs() < 1e-6);
        assert_eq!(r.signal, Signal::Hold);
    }

    #[test]
    fn zero_average_yields_none() {
        let ind = DispersionIndicator::new(3, 15.0);
        assert!(ind.compute(&[0.0, 0.0, 0.0]).is_none());
        assert!(dispersion_pct(10.0, 0.0).is_none());
    }

    #[test]
    fn series_skips_windows_averaging_to_zero() {
        let series = dispersion_series(&SmaIndicator::new(2), &[0.0, 0.0, 10.0, 20.0]);
        // windows: [0,0] skipped, [0,10] -> +100, [10,20] -> +33.3
        assert_eq!(series.len(), 2);
        assert!((series[0] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn series_ends_with_latest_reading() {
        let ind = DispersionIndicator::new(4, 10.0);
        let closes = vec![10.0, 11.0, 12.0, 13.0, 9.0, 14.0];
        let series = dispersion_series(&ind.sma, &closes);
        assert_eq!(series.len(), 3);
        let latest = ind.compute(&closes).unwrap();
        assert!((series[2] - latest.dispersion_pct).abs() < 1e-12);
    }
}
