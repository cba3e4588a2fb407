//! Basket-versus-benchmark spread and its rolling z-score.

use ronda_traits::stats::rolling_stats;
use ronda_traits::{Result, RondaError, TimeSeries};

/// Name given to the spread series.
pub const SPREAD_SERIES: &str = "spread";

/// Basket return minus benchmark return, date by date.
///
/// # Errors
///
/// The two series must share exactly the same date index; anything else is
/// a [`RondaError::DataContract`] violation. No reindexing is attempted.
pub fn compute_spread(basket: &TimeSeries, benchmark: &TimeSeries) -> Result<TimeSeries> {
    basket.ensure_aligned(benchmark, "spread")?;
    let values = basket
        .values()
        .iter()
        .zip(benchmark.values())
        .map(|(b, i)| b - i)
        .collect();
    TimeSeries::new(SPREAD_SERIES, basket.dates().to_vec(), values)
}

/// Checks a rolling window against the series it will run over.
///
/// # Errors
///
/// A window below two (no sample deviation) or not shorter than the series
/// is an [`RondaError::InvalidConfig`].
pub fn validate_window(window: usize, len: usize) -> Result<()> {
    if window < 2 {
        return Err(RondaError::InvalidConfig(format!(
            "rolling window must be at least 2, got {window}"
        )));
    }
    if window >= len {
        return Err(RondaError::InvalidConfig(format!(
            "rolling window {window} must be shorter than the series ({len} rows)"
        )));
    }
    Ok(())
}

/// Rolling z-score of every row against its trailing window.
///
/// Rows before the window fills, and windows with no dispersion, have no
/// z-score.
pub fn rolling_zscore(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    validate_window(window, values.len())?;
    Ok(rolling_stats(values, window)
        .into_iter()
        .zip(values)
        .map(|(stats, v)| stats.and_then(|s| s.zscore(*v)))
        .collect())
}
