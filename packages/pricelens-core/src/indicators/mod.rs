//! Technical indicators over price series.
//!
//! Every function here is pure. It takes borrowed series (`None` marks a gap)
//! plus integer windows, and returns owned output series of the same length:
//!
//! - **SMA / EMA**: Simple and Exponential Moving Averages
//! - **RSI**: Relative Strength Index
//! - **Stochastic**: %K / %D oscillator
//! - **MACD**: Moving Average Convergence Divergence
//! - **Bollinger Bands**: SMA with sample standard deviation bands

pub mod rolling;
mod rsi;
mod sma;
mod stochastic;

pub use rsi::{rsi, rsi_detailed, Rsi};
pub use sma::{ema, sma};
pub use stochastic::{stochastic, Stochastic};

use crate::table::Series;
use rolling::rolling_sample_std;

/// Bollinger Bands result.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    /// Middle band (SMA)
    pub middle: Series,
    /// Upper band (middle + num_std * std)
    pub upper: Series,
    /// Lower band (middle - num_std * std)
    pub lower: Series,
}

/// Calculate Bollinger Bands.
///
/// The spread is the rolling *sample* standard deviation (divisor
/// `period - 1`), matching common charting packages.
///
/// # Arguments
///
/// * `data` - Price series
/// * `period` - Lookback period (typically 20, at least 2)
/// * `num_std` - Number of standard deviations (typically 2.0)
///
/// # Returns
///
/// BollingerBands with middle, upper, and lower bands, undefined for the
/// first `period-1` rows.
pub fn bollinger_bands(data: &[Option<f64>], period: usize, num_std: f64) -> BollingerBands {
    let middle = sma(data, period);
    let spread = rolling_sample_std(data, period);

    let band = |sign: f64| -> Series {
        middle
            .iter()
            .zip(spread.iter())
            .map(|(&m, &s)| Some(m? + sign * num_std * s?))
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);

    BollingerBands {
        middle,
        upper,
        lower,
    }
}

/// MACD (Moving Average Convergence Divergence) result.
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    /// MACD line (fast EMA - slow EMA)
    pub macd_line: Series,
    /// Signal line (EMA of MACD line)
    pub signal_line: Series,
}

/// Calculate MACD indicator.
///
/// The signal line runs the EMA recurrence over the MACD line itself, not
/// over the prices.
///
/// # Arguments
///
/// * `data` - Price series
/// * `fast_period` - Fast EMA period (typically 12)
/// * `slow_period` - Slow EMA period (typically 26)
/// * `signal_period` - Signal line EMA period (typically 9)
pub fn macd(
    data: &[Option<f64>],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Macd {
    let fast_ema = ema(data, fast_period);
    let slow_ema = ema(data, slow_period);

    let macd_line: Series = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(&fast, &slow)| Some(fast? - slow?))
        .collect();

    let signal_line = ema(&macd_line, signal_period);

    Macd {
        macd_line,
        signal_line,
    }
}
