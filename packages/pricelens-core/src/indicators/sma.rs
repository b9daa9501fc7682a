//! Simple Moving Average (SMA) and Exponential Moving Average (EMA) indicators.

use super::rolling::rolling_mean;
use crate::table::Series;

/// Calculate Simple Moving Average.
///
/// # Arguments
///
/// * `data` - Price series (`None` marks a gap)
/// * `period` - Lookback period
///
/// # Returns
///
/// Vector of SMA values. The first `period-1` values, and every window that
/// contains a gap, are `None`.
///
/// # Example
///
/// ```rust
/// use pricelens_core::indicators::sma;
///
/// let prices: Vec<Option<f64>> = [10.0, 11.0, 12.0, 11.0, 10.0].iter().map(|&p| Some(p)).collect();
/// let sma_values = sma(&prices, 3);
///
/// // SMA at index 2 = (10 + 11 + 12) / 3 = 11.0
/// assert!((sma_values[2].unwrap() - 11.0).abs() < 0.001);
/// assert!(sma_values[1].is_none());
/// ```
pub fn sma(data: &[Option<f64>], period: usize) -> Series {
    rolling_mean(data, period)
}

/// Calculate Exponential Moving Average.
///
/// Uses the formula: EMA[i] = alpha * price[i] + (1 - alpha) * EMA[i-1]
/// where alpha = 2 / (period + 1), seeded with the first price.
///
/// A gap row reports `None` and the recurrence resumes from the last defined
/// value on the next present price.
///
/// # Example
///
/// ```rust
/// use pricelens_core::indicators::ema;
///
/// let prices = vec![Some(10.0), Some(11.0), Some(12.0)];
/// let ema_values = ema(&prices, 3);
///
/// assert_eq!(ema_values[0], Some(10.0));
/// assert_eq!(ema_values[1], Some(10.5));
/// ```
pub fn ema(data: &[Option<f64>], period: usize) -> Series {
    if period == 0 {
        return vec![None; data.len()];
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    data.iter()
        .scan(None, |state: &mut Option<f64>, &value| {
            let out = value.map(|price| {
                let next = match *state {
                    Some(prev) => alpha * price + (1.0 - alpha) * prev,
                    None => price,
                };
                *state = Some(next);
                next
            });
            Some(out)
        })
        .collect()
}
