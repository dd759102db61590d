pub mod analyzer;
pub mod config;
pub mod indicators;
pub mod report;
pub mod scanner;
pub mod stats;

pub use analyzer::analyze;
pub use config::{ConfigWarning, ScanConfig, TEST_TICKERS};
pub use indicators::{DispersionIndicator, SmaIndicator};
pub use scanner::{scan, Scanner};
pub use stats::{dispersion_statistics, DispersionStats};
