//! Single-instrument strategy rules over a close-price history.

use ronda_traits::stats::rolling_stats;
use ronda_traits::{Result, RondaError, SignalRule, TimeSeries};
use serde::{Deserialize, Serialize};

use crate::trend::{crossover_signals, validate_periods};

/// Closed set of price-based strategies.
///
/// Every variant maps a close-price history to one signal in `{-1, 0, 1}`
/// per row; rows without enough history emit `0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyKind {
    /// Fast/slow simple moving-average crossover.
    GoldenCross {
        /// Fast moving-average period.
        fast: usize,
        /// Slow moving-average period.
        slow: usize,
    },
    /// Buy below, sell above a rolling band around the mean.
    MeanReversion {
        /// Rolling window for mean and standard deviation.
        window: usize,
        /// Band half-width in standard deviations.
        band: f64,
    },
    /// Trade in the direction of the trailing return.
    Momentum {
        /// Return lookback in rows.
        period: usize,
        /// Minimum absolute trailing return that triggers a signal.
        threshold: f64,
    },
}

impl StrategyKind {
    /// 50/200-day golden cross.
    pub const fn golden_cross() -> Self {
        Self::GoldenCross {
            fast: 50,
            slow: 200,
        }
    }

    /// 20-day, one standard deviation band.
    pub const fn mean_reversion() -> Self {
        Self::MeanReversion {
            window: 20,
            band: 1.0,
        }
    }

    /// 10-day momentum with a 2% trigger.
    pub const fn momentum() -> Self {
        Self::Momentum {
            period: 10,
            threshold: 0.02,
        }
    }

    /// Checks the variant's parameters.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::GoldenCross { fast, slow } => validate_periods(fast, slow),
            Self::MeanReversion { window, band } => {
                if window < 2 {
                    return Err(RondaError::InvalidConfig(format!(
                        "mean reversion window must be at least 2, got {window}"
                    )));
                }
                if !band.is_finite() || band <= 0.0 {
                    return Err(RondaError::InvalidConfig(format!(
                        "mean reversion band must be positive, got {band}"
                    )));
                }
                Ok(())
            }
            Self::Momentum { period, threshold } => {
                if period == 0 {
                    return Err(RondaError::InvalidConfig(
                        "momentum period must be positive".to_string(),
                    ));
                }
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(RondaError::InvalidConfig(format!(
                        "momentum threshold must be non-negative, got {threshold}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Signals for a close-price history.
    ///
    /// # Errors
    ///
    /// Fails for invalid parameters, or for non-positive prices where a
    /// return is taken.
    pub fn signals(&self, closes: &[f64]) -> Result<Vec<i8>> {
        self.validate()?;
        match *self {
            Self::GoldenCross { fast, slow } => crossover_signals(closes, fast, slow),
            Self::MeanReversion { window, band } => Ok(rolling_stats(closes, window)
                .into_iter()
                .zip(closes)
                .map(|(stats, &close)| match stats {
                    Some(s) if close < s.mean - band * s.std => 1,
                    Some(s) if close > s.mean + band * s.std => -1,
                    _ => 0,
                })
                .collect()),
            Self::Momentum { period, threshold } => closes
                .iter()
                .enumerate()
                .map(|(i, &close)| {
                    if i < period {
                        return Ok(0);
                    }
                    let past = closes[i - period];
                    if past <= 0.0 {
                        return Err(RondaError::DataContract(format!(
                            "momentum: non-positive price {past} at row {}",
                            i - period
                        )));
                    }
                    let change = close / past - 1.0;
                    Ok(if change > threshold {
                        1
                    } else if change < -threshold {
                        -1
                    } else {
                        0
                    })
                })
                .collect(),
        }
    }
}

impl SignalRule for StrategyKind {
    fn name(&self) -> &str {
        match self {
            Self::GoldenCross { .. } => "golden_cross",
            Self::MeanReversion { .. } => "mean_reversion",
            Self::Momentum { .. } => "momentum",
        }
    }

    fn lookback(&self) -> usize {
        match *self {
            Self::GoldenCross { slow, .. } => slow,
            Self::MeanReversion { window, .. } => window,
            Self::Momentum { period, .. } => period,
        }
    }

    fn generate(&self, series: &TimeSeries) -> Result<Vec<i8>> {
        let signals = self.signals(series.values())?;
        tracing::debug!(
            strategy = self.name(),
            buys = signals.iter().filter(|&&s| s == 1).count(),
            sells = signals.iter().filter(|&&s| s == -1).count(),
            "strategy signals generated"
        );
        Ok(signals)
    }
}
