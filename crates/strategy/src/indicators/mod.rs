pub mod dispersion;
pub mod sma;

pub use dispersion::{
    classify, dispersion_pct, dispersion_series, DispersionIndicator, DispersionReading,
};
pub use sma::SmaIndicator;
