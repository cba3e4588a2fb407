//! Performance metrics on per-period returns and cumulative wealth.
//!
//! Cumulative series here are running products of `(1 + r)` that start
//! from a multiplier of 1, not cumulative sums.

use ronda_traits::stats::{mean, sample_std};

/// Annualized Sharpe ratio.
///
/// `(mean · periods − risk_free_rate) / (std · √periods)` with the sample
/// standard deviation. Reported as `0.0` when the deviation is zero or
/// undefined (fewer than two returns).
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: usize) -> f64 {
    let (Some(m), Some(s)) = (mean(returns), sample_std(returns)) else {
        return 0.0;
    };
    if s == 0.0 {
        return 0.0;
    }
    let periods = periods_per_year as f64;
    (m * periods - risk_free_rate) / (s * periods.sqrt())
}

/// Arithmetic annualized return, `mean · periods`.
pub fn annualized_return(returns: &[f64], periods_per_year: usize) -> f64 {
    mean(returns).map_or(0.0, |m| m * periods_per_year as f64)
}

/// Annualized volatility, `std · √periods`.
pub fn annualized_volatility(returns: &[f64], periods_per_year: usize) -> f64 {
    sample_std(returns).map_or(0.0, |s| s * (periods_per_year as f64).sqrt())
}

/// Relative distance of every point from its running peak.
///
/// `(wealth − peak) / peak`, where the peak includes the current point.
/// Values lie in `[-1, 0]`; wealth at or below zero counts as a total loss.
pub fn drawdown_series(cumulative: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    cumulative
        .iter()
        .map(|&wealth| {
            peak = peak.max(wealth);
            if peak <= 0.0 {
                -1.0
            } else {
                ((wealth - peak) / peak).max(-1.0)
            }
        })
        .collect()
}

/// Deepest drawdown of a cumulative series, `0.0` for an empty series.
pub fn max_drawdown(cumulative: &[f64]) -> f64 {
    drawdown_series(cumulative)
        .into_iter()
        .fold(0.0, f64::min)
}
