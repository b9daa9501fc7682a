//! Relative Strength Index (RSI) indicator.

use super::rolling::diff;
use crate::table::Series;

/// RSI series together with how many rows took the zero-loss branch.
#[derive(Debug, Clone, PartialEq)]
pub struct Rsi {
    /// RSI values (0-100 scale)
    pub values: Series,
    /// Rows whose window had no losses and were resolved as RSI = 100
    pub zero_loss_rows: usize,
}

/// Calculate RSI value from average gain and average loss.
///
/// A window without losses has no defined ratio. It is resolved as RSI = 100,
/// including the flat case where gains are zero too.
#[inline]
fn calculate_rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

/// Calculate Relative Strength Index.
///
/// Formula:
/// 1. delta[t] = price[t] - price[t-1]
/// 2. gain = max(delta, 0), loss = max(-delta, 0)
/// 3. Average gain and average loss as simple means over the trailing `period` rows
/// 4. RS = average_gain / average_loss
/// 5. RSI = 100 - (100 / (1 + RS))
///
/// The first defined row is `period` (the first delta is at row 1). Windows
/// touching a gap are `None`.
///
/// # Example
///
/// ```rust
/// use pricelens_core::indicators::rsi;
///
/// let prices: Vec<Option<f64>> = [44.0, 44.25, 44.5, 43.75, 44.5, 44.25, 44.5, 44.0, 43.5, 44.0,
///                   44.25, 44.0, 43.5, 44.0, 44.5, 44.25, 44.0].iter().map(|&p| Some(p)).collect();
/// let rsi_values = rsi(&prices, 14);
///
/// assert!(rsi_values[13].is_none());
/// for value in rsi_values.iter().flatten() {
///     assert!(*value >= 0.0 && *value <= 100.0);
/// }
/// ```
pub fn rsi(prices: &[Option<f64>], period: usize) -> Series {
    rsi_detailed(prices, period).values
}

/// Calculate RSI and count the rows resolved by the zero-loss branch.
pub fn rsi_detailed(prices: &[Option<f64>], period: usize) -> Rsi {
    let n = prices.len();
    let mut values = vec![None; n];
    let mut zero_loss_rows = 0;

    // Need at least period+1 prices to calculate
    if period == 0 || n <= period {
        return Rsi {
            values,
            zero_loss_rows,
        };
    }

    let deltas = diff(prices);

    for i in period..n {
        let window = &deltas[i + 1 - period..=i];
        let Some((gain_sum, loss_sum)) = window.iter().try_fold((0.0, 0.0), |(g, l), d| {
            d.map(|change| (g + change.max(0.0), l + (-change).max(0.0)))
        }) else {
            continue;
        };

        let avg_gain = gain_sum / period as f64;
        let avg_loss = loss_sum / period as f64;
        if avg_loss <= 0.0 {
            zero_loss_rows += 1;
        }
        values[i] = Some(calculate_rsi_value(avg_gain, avg_loss));
    }

    Rsi {
        values,
        zero_loss_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn some(values: &[f64]) -> Series {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn test_rsi_warmup() {
        let prices: Series = (0..20).map(|i| Some(100.0 + i as f64)).collect();
        let values = rsi(&prices, 14);

        assert!(values[..14].iter().all(Option::is_none));
        assert!(values[14..].iter().all(Option::is_some));
    }

    #[test]
    fn test_rsi_known_value() {
        // deltas: +1, -1, +2, +1 -> window 3 at row 4: gains 3, losses 1
        let prices = some(&[10.0, 11.0, 10.0, 12.0, 13.0]);
        let values = rsi(&prices, 3);

        // row 3: gains (1 + 2), losses 1 -> RS = 3 -> RSI = 75
        assert_relative_eq!(values[3].unwrap(), 75.0);
        // row 4: deltas -1, +2, +1 -> gains 3, losses 1 -> 75
        assert_relative_eq!(values[4].unwrap(), 75.0);
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let prices: Series = (0..20).map(|i| Some(100.0 + i as f64)).collect();
        let result = rsi_detailed(&prices, 14);

        assert!(result.values[14..].iter().all(|v| *v == Some(100.0)));
        assert_eq!(result.zero_loss_rows, 6);
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let prices: Series = (0..20).map(|i| Some(100.0 - i as f64)).collect();
        let values = rsi(&prices, 14);

        assert!(values[14..].iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn test_rsi_flat_series_is_100() {
        let prices = some(&[50.0; 20]);
        let result = rsi_detailed(&prices, 14);

        assert!(result.values[14..].iter().all(|v| *v == Some(100.0)));
        assert_eq!(result.zero_loss_rows, 6);
    }

    #[test]
    fn test_rsi_range() {
        let prices: Series = (0..80)
            .map(|i| Some(100.0 + (i as f64 * 0.5).sin() * 10.0))
            .collect();

        for value in rsi(&prices, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_neutral() {
        // Alternating up/down should give RSI around 50
        let prices: Series = (0..30)
            .map(|i| Some(if i % 2 == 0 { 101.0 } else { 99.0 }))
            .collect();
        let values = rsi(&prices, 14);

        let last = values[29].unwrap();
        assert!(last > 40.0 && last < 60.0);
    }

    #[test]
    fn test_rsi_gap() {
        let mut prices: Series = (0..10).map(|i| Some(100.0 + i as f64)).collect();
        prices[5] = None;
        let values = rsi(&prices, 3);

        // deltas at rows 5 and 6 are undefined, so windows ending at rows 5..=8 are too
        assert!(values[4].is_some());
        assert!(values[5..=8].iter().all(Option::is_none));
        assert_eq!(values[9], Some(100.0));
    }

    #[test]
    fn test_rsi_short_data() {
        let values = rsi(&some(&[100.0, 101.0, 102.0]), 14);
        assert!(values.iter().all(Option::is_none));
    }
}
