//! Moving-average crossovers.

use ronda_traits::stats::rolling_mean;
use ronda_traits::{Date, Result, RondaError, TimeSeries};
use serde::Serialize;

/// Dates on which the fast average crossed the slow one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrendCrossovers {
    /// Fast average moved from below to above the slow one.
    pub bullish: Vec<Date>,
    /// Fast average moved from above to below the slow one.
    pub bearish: Vec<Date>,
}

pub(crate) fn validate_periods(fast: usize, slow: usize) -> Result<()> {
    if fast == 0 || fast >= slow {
        return Err(RondaError::InvalidConfig(format!(
            "moving-average periods must satisfy 0 < fast < slow, got fast={fast} slow={slow}"
        )));
    }
    Ok(())
}

/// `1` on a bullish crossover, `-1` on a bearish one, `0` otherwise.
///
/// A crossover needs the fast-minus-slow difference to change strict sign
/// between two consecutive rows where both averages are defined.
pub fn crossover_signals(closes: &[f64], fast: usize, slow: usize) -> Result<Vec<i8>> {
    validate_periods(fast, slow)?;
    let fast_ma = rolling_mean(closes, fast);
    let slow_ma = rolling_mean(closes, slow);
    let diff: Vec<Option<f64>> = fast_ma
        .into_iter()
        .zip(slow_ma)
        .map(|(f, s)| Some(f? - s?))
        .collect();

    let mut signals = vec![0_i8; closes.len()];
    for i in 1..closes.len() {
        if let (Some(prev), Some(curr)) = (diff[i - 1], diff[i]) {
            if prev < 0.0 && curr > 0.0 {
                signals[i] = 1;
            } else if prev > 0.0 && curr < 0.0 {
                signals[i] = -1;
            }
        }
    }
    Ok(signals)
}

/// Bullish and bearish crossover dates of a close-price series.
pub fn identify_trends(closes: &TimeSeries, fast: usize, slow: usize) -> Result<TrendCrossovers> {
    let signals = crossover_signals(closes.values(), fast, slow)?;
    let mut trends = TrendCrossovers::default();
    for (date, signal) in closes.dates().iter().zip(signals) {
        match signal {
            1 => trends.bullish.push(*date),
            -1 => trends.bearish.push(*date),
            _ => {}
        }
    }
    tracing::debug!(
        bullish = trends.bullish.len(),
        bearish = trends.bearish.len(),
        "trend crossovers identified"
    );
    Ok(trends)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closes(values: Vec<f64>) -> TimeSeries {
        let start = Date::from_ymd_opt(2023, 1, 1).unwrap();
        let dates = (0..values.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        TimeSeries::new("close", dates, values).unwrap()
    }

    #[test]
    fn test_bullish_then_bearish() {
        // Down, then up, then down again.
        let values = vec![10.0, 9.0, 8.0, 7.0, 8.0, 9.0, 10.0, 11.0, 10.0, 9.0, 8.0, 7.0];
        let signals = crossover_signals(&values, 2, 4).unwrap();

        let up = signals.iter().position(|&s| s == 1).unwrap();
        let down = signals.iter().position(|&s| s == -1).unwrap();
        assert!(up < down);
        assert_eq!(signals.iter().filter(|&&s| s != 0).count(), 2);
    }

    #[test]
    fn test_steady_trend_has_no_bearish_signal() {
        // A persistently positive difference is not a crossover.
        let values: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let signals = crossover_signals(&values, 3, 10).unwrap();
        assert!(signals.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_identify_trends_dates() {
        let series = closes(vec![10.0, 9.0, 8.0, 7.0, 8.0, 9.0, 10.0, 11.0, 10.0, 9.0, 8.0, 7.0]);
        let trends = identify_trends(&series, 2, 4).unwrap();
        assert_eq!(trends.bullish.len(), 1);
        assert_eq!(trends.bearish.len(), 1);
        assert!(trends.bullish[0] < trends.bearish[0]);
    }

    #[test]
    fn test_invalid_periods() {
        assert!(crossover_signals(&[1.0, 2.0], 0, 2).is_err());
        assert!(crossover_signals(&[1.0, 2.0], 5, 5).is_err());
    }
}
