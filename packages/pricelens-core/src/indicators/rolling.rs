//! Rolling-window primitives over series with gaps.
//!
//! A window is only evaluated when it is full and every value inside it is
//! present. Otherwise the output row is `None`.

use crate::table::Series;

/// Trailing arithmetic mean over `window` rows, current row included.
///
/// Uses a running sum of the present values plus a count of gaps in the
/// window, so each step drops the oldest value and adds the newest. A
/// non-finite running sum is rebuilt from the window, and a window whose
/// sum overflows is `None`.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Series {
    let n = values.len();
    let mut result = vec![None; n];

    if window == 0 || window > n {
        return result;
    }

    let mut sum = 0.0;
    let mut missing = 0usize;

    for i in 0..n {
        match values[i] {
            Some(v) => sum += v,
            None => missing += 1,
        }
        if i >= window {
            match values[i - window] {
                Some(v) => sum -= v,
                None => missing -= 1,
            }
        }
        if i + 1 >= window && missing == 0 {
            if !sum.is_finite() {
                sum = values[i + 1 - window..=i].iter().flatten().sum();
            }
            if sum.is_finite() {
                result[i] = Some(sum / window as f64);
            }
        }
    }

    result
}

/// Trailing sample standard deviation (divisor `window - 1`).
///
/// Each window is recomputed with a two-pass mean/variance. Flat windows
/// give exactly zero. Windows shorter than two rows are undefined.
pub fn rolling_sample_std(values: &[Option<f64>], window: usize) -> Series {
    let n = values.len();
    let mut result = vec![None; n];

    if window < 2 || window > n {
        return result;
    }

    for i in (window - 1)..n {
        let start = i + 1 - window;
        let Some(slice) = values[start..=i].iter().copied().collect::<Option<Vec<f64>>>() else {
            continue;
        };
        if slice.iter().all(|&x| x == slice[0]) {
            result[i] = Some(0.0);
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let variance =
            slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
        result[i] = Some(variance.max(0.0).sqrt()).filter(|s| s.is_finite());
    }

    result
}

/// Trailing minimum over `window` rows.
pub fn rolling_min(values: &[Option<f64>], window: usize) -> Series {
    rolling_fold(values, window, f64::INFINITY, f64::min)
}

/// Trailing maximum over `window` rows.
pub fn rolling_max(values: &[Option<f64>], window: usize) -> Series {
    rolling_fold(values, window, f64::NEG_INFINITY, f64::max)
}

fn rolling_fold(
    values: &[Option<f64>],
    window: usize,
    init: f64,
    f: fn(f64, f64) -> f64,
) -> Series {
    let n = values.len();
    let mut result = vec![None; n];

    if window == 0 || window > n {
        return result;
    }

    for i in (window - 1)..n {
        let start = i + 1 - window;
        result[i] = values[start..=i]
            .iter()
            .try_fold(init, |acc, v| v.map(|x| f(acc, x)));
    }

    result
}

/// First difference: `out[t] = values[t] - values[t-1]`, undefined at row 0.
pub fn diff(values: &[Option<f64>]) -> Series {
    if values.is_empty() {
        return Vec::new();
    }

    std::iter::once(None)
        .chain(values.windows(2).map(|pair| match (pair[0], pair[1]) {
            (Some(prev), Some(curr)) => Some(curr - prev),
            _ => None,
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn some(values: &[f64]) -> Series {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn test_rolling_mean_warmup() {
        let result = rolling_mean(&some(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3);
        assert!(result[..2].iter().all(Option::is_none));
        assert_relative_eq!(result[2].unwrap(), 2.0);
        assert_relative_eq!(result[3].unwrap(), 3.0);
        assert_relative_eq!(result[4].unwrap(), 4.0);
    }

    #[test]
    fn test_rolling_mean_matches_fresh_recompute() {
        let values: Series = (0..200)
            .map(|i| Some(100.0 + (i as f64 * 0.7).sin() * 25.0))
            .collect();
        let window = 20;
        let result = rolling_mean(&values, window);

        for i in (window - 1)..values.len() {
            let fresh: f64 =
                values[i + 1 - window..=i].iter().map(|v| v.unwrap()).sum::<f64>() / window as f64;
            assert_relative_eq!(result[i].unwrap(), fresh, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rolling_mean_gap_poisons_window_only() {
        let values = vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0)];
        let result = rolling_mean(&values, 2);
        assert_eq!(result[1], Some(1.5));
        assert_eq!(result[2], None);
        assert_eq!(result[3], None);
        assert_eq!(result[4], Some(4.5));
        assert_eq!(result[5], Some(5.5));
    }

    #[test]
    fn test_rolling_mean_recovers_after_non_finite_value() {
        let values = some(&[1.0, 2.0, f64::INFINITY, 4.0, 5.0, 6.0, 7.0]);
        let result = rolling_mean(&values, 2);
        assert_eq!(
            result,
            vec![None, Some(1.5), None, None, Some(4.5), Some(5.5), Some(6.5)]
        );
    }

    #[test]
    fn test_rolling_mean_overflowing_window_is_undefined() {
        let values = some(&[f64::MAX, f64::MAX, 1.0, 2.0, 3.0, 4.0]);
        let result = rolling_mean(&values, 2);
        assert_eq!(result[1], None);
        assert!(result.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_rolling_mean_window_too_large() {
        let result = rolling_mean(&some(&[1.0, 2.0]), 5);
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn test_rolling_sample_std() {
        // Sample std of [2, 4, 4, 4, 5, 5, 7, 9] is sqrt(32 / 7)
        let values = some(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let result = rolling_sample_std(&values, 8);
        assert_relative_eq!(result[7].unwrap(), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert!(result[..7].iter().all(Option::is_none));
    }

    #[test]
    fn test_rolling_sample_std_flat_is_zero() {
        let result = rolling_sample_std(&some(&[3.3; 5]), 3);
        assert_eq!(result[4], Some(0.0));
    }

    #[test]
    fn test_rolling_sample_std_window_one_undefined() {
        let result = rolling_sample_std(&some(&[1.0, 2.0]), 1);
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn test_rolling_min_max() {
        let values = some(&[5.0, 3.0, 8.0, 1.0, 4.0]);
        assert_eq!(
            rolling_min(&values, 3),
            vec![None, None, Some(3.0), Some(1.0), Some(1.0)]
        );
        assert_eq!(
            rolling_max(&values, 3),
            vec![None, None, Some(8.0), Some(8.0), Some(8.0)]
        );
    }

    #[test]
    fn test_rolling_max_with_gap() {
        let values = vec![Some(1.0), None, Some(3.0), Some(2.0)];
        assert_eq!(rolling_max(&values, 2), vec![None, None, None, Some(3.0)]);
    }

    #[test]
    fn test_diff() {
        let values = vec![Some(10.0), Some(12.0), None, Some(11.0), Some(9.0)];
        assert_eq!(diff(&values), vec![None, Some(2.0), None, None, Some(-2.0)]);
        assert!(diff(&[]).is_empty());
    }
}
