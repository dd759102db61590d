/// Simple Moving Average indicator.
///
/// Unweighted mean of the most recent `period` closes; every sample in the
/// window contributes equally.
#[derive(Debug, Clone, Copy)]
pub struct SmaIndicator {
    pub period: usize,
}

impl SmaIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self { period }
    }

    /// Mean of the last `period` values of `closes` (oldest first).
    /// Returns `None` if there are fewer than `period` values.
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        if closes.len() < self.period {
            return None;
        }
        let window = &closes[closes.len() - self.period..];
        Some(window.iter().sum::<f64>() / self.period as f64)
    }

    /// Rolling SMA aligned to `closes[period - 1..]`.
    /// Empty if there are fewer than `period` values.
    pub fn series(&self, closes: &[f64]) -> Vec<f64> {
        closes
            .windows(self.period)
            .map(|w| w.iter().sum::<f64>() / self.period as f64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_returns_none_when_insufficient_data() {
        let sma = SmaIndicator::new(29);
        let prices = vec![100.0; 28];
        assert!(sma.compute(&prices).is_none());
    }

    #[test]
    fn sma_uses_exactly_the_last_period_values() {
        let sma = SmaIndicator::new(3);
        // The leading 1000.0 must not leak into the window
        let prices = vec![1000.0, 1.0, 2.0, 3.0];
        assert_eq!(sma.compute(&prices), Some(2.0));
    }

    #[test]
    fn sma_with_exact_length_is_full_mean() {
        let sma = SmaIndicator::new(4);
        assert_eq!(sma.compute(&[2.0, 4.0, 6.0, 8.0]), Some(5.0));
    }

    #[test]
    fn series_last_value_matches_compute() {
        let sma = SmaIndicator::new(5);
        let prices: Vec<f64> = (0..20).map(|i| 50.0 + (i as f64 * 1.7).sin() * 4.0).collect();
        let series = sma.series(&prices);
        assert_eq!(series.len(), 16);
        let last = *series.last().unwrap();
        assert!((last - sma.compute(&prices).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn period_one_is_the_last_close() {
        let sma = SmaIndicator::new(1);
        assert_eq!(sma.compute(&[3.0, 7.5]), Some(7.5));
    }

    #[test]
    #[should_panic(expected = "SMA period must be >= 1")]
    fn zero_period_is_rejected() {
        SmaIndicator::new(0);
    }
}
