//! Stochastic Oscillator (%K / %D).

use super::rolling::{rolling_max, rolling_mean, rolling_min};
use crate::table::Series;

/// Stochastic Oscillator result.
#[derive(Debug, Clone, PartialEq)]
pub struct Stochastic {
    /// %K line: position of the close inside the trailing high/low range
    pub k: Series,
    /// %D line: SMA of %K
    pub d: Series,
    /// Rows where the high/low range had zero width and %K was left undefined
    pub degenerate_rows: usize,
}

/// Calculate the Stochastic Oscillator.
///
/// %K[t] = 100 * (close[t] - lowest_low) / (highest_high - lowest_low), with
/// the extremes taken over the trailing `k_period` rows. A zero-width range
/// has no position to report, so %K is `None` there rather than a division
/// by zero. %D is the `d_period` SMA of %K.
///
/// %K is not clamped: it stays within [0, 100] only while each row has
/// `low <= close <= high`.
///
/// # Arguments
///
/// * `high` - High price series
/// * `low` - Low price series
/// * `close` - Close price series
/// * `k_period` - %K lookback (typically 14)
/// * `d_period` - %D smoothing (typically 3)
pub fn stochastic(
    high: &[Option<f64>],
    low: &[Option<f64>],
    close: &[Option<f64>],
    k_period: usize,
    d_period: usize,
) -> Stochastic {
    let lowest = rolling_min(low, k_period);
    let highest = rolling_max(high, k_period);

    let mut degenerate_rows = 0;
    let k: Series = close
        .iter()
        .zip(lowest.iter().zip(highest.iter()))
        .map(|(&c, (&ll, &hh))| {
            let (c, ll, hh) = (c?, ll?, hh?);
            let range = hh - ll;
            if range > 0.0 {
                Some(100.0 * (c - ll) / range)
            } else {
                degenerate_rows += 1;
                None
            }
        })
        .collect();

    let d = rolling_mean(&k, d_period);

    Stochastic {
        k,
        d,
        degenerate_rows,
    }
}
