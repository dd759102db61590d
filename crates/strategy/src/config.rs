use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Upper bound on `lookback_days` (about a century).
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

/// Tickers scanned by `--test`.
pub const TEST_TICKERS: [&str; 3] = ["AAPL", "MSFT", "GOOGL"];

/// Scan parameters (TOML). Immutable once loaded; shared as `Arc<ScanConfig>`.
///
/// Example `config/scanner.toml`:
/// ```toml
/// tickers = ["AAPL", "MSFT", "NVDA"]
/// sma_period = 29
/// dispersion_threshold = 15.0
/// lookback_days = 60
/// max_concurrent_fetches = 4
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Symbols to scan, in report order.
    pub tickers: Vec<String>,
    /// Number of closes averaged into the SMA.
    pub sma_period: usize,
    /// Absolute dispersion (percent) at which BUY/SELL fires.
    pub dispersion_threshold: f64,
    /// Calendar days of history requested per ticker.
    pub lookback_days: u32,
    /// Upper bound on in-flight fetches. `1` scans strictly sequentially.
    pub max_concurrent_fetches: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tickers: [
                "AAPL", "MSFT", "GOOGL", "VIST", "META", "NVDA", "TSLA", "JPM", "V", "MU", "WMT",
                "NU", "CRWV", "ONDS", "GGAL", "NFLX", "CEPU", "EDN", "BMA", "LOMA",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            sma_period: 29,
            dispersion_threshold: 15.0,
            lookback_days: 60,
            max_concurrent_fetches: 4,
        }
    }
}

/// Non-fatal configuration finding, logged before a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// The lookback leaves little slack for weekends and holidays.
    ShortLookback { lookback_days: u32, recommended: u32 },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::ShortLookback {
                lookback_days,
                recommended,
            } => write!(
                f,
                "lookback_days = {lookback_days} is below 2 x sma_period ({recommended}); \
                 tickers may report INSUFFICIENT_DATA"
            ),
        }
    }
}

impl ScanConfig {
    /// Load from a TOML file and normalise tickers. Does not validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read scan config at '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut cfg: ScanConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse scan config: {e}")))?;
        cfg.tickers = normalize_tickers(&cfg.tickers);
        Ok(cfg)
    }

    /// Replace the ticker list (e.g. from `--tickers AAPL,msft`).
    pub fn with_tickers<S: AsRef<str>>(mut self, tickers: &[S]) -> Self {
        self.tickers = normalize_tickers(tickers);
        self
    }

    /// Reject unusable parameters; return non-fatal warnings otherwise.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>> {
        if self.tickers.is_empty() {
            return Err(Error::Config("ticker list is empty".into()));
        }
        if self.sma_period == 0 {
            return Err(Error::Config("sma_period must be >= 1".into()));
        }
        if !self.dispersion_threshold.is_finite() || self.dispersion_threshold < 0.0 {
            return Err(Error::Config(format!(
                "dispersion_threshold must be a finite value >= 0, got {}",
                self.dispersion_threshold
            )));
        }
        if self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(Error::Config(format!(
                "lookback_days must be <= {MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            )));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(Error::Config("max_concurrent_fetches must be >= 1".into()));
        }

        let mut warnings = Vec::new();
        let recommended = (self.sma_period as u32).saturating_mul(2);
        if self.lookback_days < recommended {
            warnings.push(ConfigWarning::ShortLookback {
                lookback_days: self.lookback_days,
                recommended,
            });
        }
        Ok(warnings)
    }
}

/// Trim, upper-case and de-duplicate, keeping first occurrences in order.
pub fn normalize_tickers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|t| t.as_ref().trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
