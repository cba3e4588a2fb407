//! Statistical helpers shared across the pipeline.
//!
//! Standard deviations use the sample (N-1) denominator throughout, so
//! rolling z-scores, Sharpe ratios and VaR agree with each other.

/// Trading days per year used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Mean and sample standard deviation of one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    /// Arithmetic mean of the window.
    pub mean: f64,
    /// Sample standard deviation (N-1 denominator).
    pub std: f64,
}

impl WindowStats {
    /// Z-score of `value` against this window, `None` when the window has
    /// no dispersion.
    pub fn zscore(&self, value: f64) -> Option<f64> {
        (self.std > MIN_STD_THRESHOLD).then(|| (value - self.mean) / self.std)
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation with Bessel's correction.
///
/// Returns `None` with fewer than two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}

/// Mean and sample standard deviation of a slice.
pub fn window_stats(values: &[f64]) -> Option<WindowStats> {
    Some(WindowStats {
        mean: mean(values)?,
        std: sample_std(values)?,
    })
}

/// Rolling statistics over a trailing window that includes the current row.
///
/// The first `window - 1` rows have no complete window and yield `None`,
/// as does every row when `window < 2`.
pub fn rolling_stats(values: &[f64], window: usize) -> Vec<Option<WindowStats>> {
    (0..values.len())
        .map(|i| {
            if window < 2 || i + 1 < window {
                None
            } else {
                window_stats(&values[i + 1 - window..=i])
            }
        })
        .collect()
}

/// Simple moving average over a trailing window, `None` before it fills.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                mean(&values[i + 1 - window..=i])
            }
        })
        .collect()
}

/// Running product of `(1 + r)`, starting from a multiplier of 1.
pub fn compound(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |acc, r| {
            *acc *= 1.0 + r;
            Some(*acc)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean_and_std() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_abs_diff_eq!(mean(&values).unwrap(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sample_std(&values).unwrap(), 2.5_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(mean(&[]).is_none());
        assert!(sample_std(&[]).is_none());
        assert!(sample_std(&[42.0]).is_none());
    }

    #[test]
    fn test_rolling_stats_warmup() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        let stats = rolling_stats(&values, 3);

        assert!(stats[0].is_none());
        assert!(stats[1].is_none());
        let third = stats[2].unwrap();
        assert_abs_diff_eq!(third.mean, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(third.std, 1.0, epsilon = 1e-12);
        let fourth = stats[3].unwrap();
        assert_abs_diff_eq!(fourth.mean, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rolling_stats_window_one() {
        let stats = rolling_stats(&[1.0, 2.0], 1);
        assert!(stats.iter().all(Option::is_none));
    }

    #[test]
    fn test_zscore_constant_window() {
        let stats = window_stats(&[5.0, 5.0, 5.0]).unwrap();
        assert!(stats.zscore(5.0).is_none());

        let stats = window_stats(&[1.0, 2.0, 3.0]).unwrap();
        assert_abs_diff_eq!(stats.zscore(3.0).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rolling_mean() {
        let sma = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(sma, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn test_compound() {
        let cumulative = compound(&[0.1, -0.1, 0.0]);
        assert_abs_diff_eq!(cumulative[0], 1.1, epsilon = 1e-12);
        assert_abs_diff_eq!(cumulative[1], 0.99, epsilon = 1e-12);
        assert_abs_diff_eq!(cumulative[2], 0.99, epsilon = 1e-12);
    }
}
