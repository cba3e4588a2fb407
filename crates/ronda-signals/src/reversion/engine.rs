//! Spread mean-reversion rule: rolling z-score fed through the state machine.

use polars::prelude::*;
use ronda_traits::{DATE_COLUMN, Date, Result, RondaError, SignalRule, TimeSeries};
use serde::{Deserialize, Serialize};

use super::state::{PositionState, SignalWalk, Thresholds};
use crate::spread::{rolling_zscore, validate_window};

/// Configuration for spread mean reversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReversionConfig {
    /// Rolling window for the z-score mean and standard deviation.
    pub window: usize,
    /// Absolute z-score beyond which a position is opened.
    pub entry_z: f64,
    /// Absolute z-score inside which an open position is closed.
    pub exit_z: f64,
}

impl Default for ReversionConfig {
    fn default() -> Self {
        Self {
            window: 20,
            entry_z: 2.0,
            exit_z: 0.5,
        }
    }
}

impl ReversionConfig {
    /// Checks the thresholds and the series-independent window bound.
    pub fn validate(&self) -> Result<()> {
        self.thresholds()?;
        validate_window(self.window, usize::MAX)
    }

    /// Validated threshold pair.
    pub fn thresholds(&self) -> Result<Thresholds> {
        Thresholds::new(self.entry_z, self.exit_z)
    }
}

/// Per-row output of a reversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    dates: Vec<Date>,
    zscores: Vec<Option<f64>>,
    signals: Vec<i8>,
    states: Vec<PositionState>,
}

impl SignalSeries {
    /// Walks `zscores` through the state machine, starting flat.
    pub fn from_zscores(
        dates: Vec<Date>,
        zscores: Vec<Option<f64>>,
        thresholds: Thresholds,
    ) -> Result<Self> {
        if dates.len() != zscores.len() {
            return Err(RondaError::DataContract(format!(
                "signal series: {} dates but {} z-scores",
                dates.len(),
                zscores.len()
            )));
        }
        let (signals, states) = SignalWalk::new(zscores.iter().copied(), thresholds).unzip();
        Ok(Self {
            dates,
            zscores,
            signals,
            states,
        })
    }

    /// Date index, equal to the spread's.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Z-score per row, `None` before the window fills.
    pub fn zscores(&self) -> &[Option<f64>] {
        &self.zscores
    }

    /// Raw signals in `{-1, 0, 1}`.
    pub fn signals(&self) -> &[i8] {
        &self.signals
    }

    /// State after each row.
    pub fn states(&self) -> &[PositionState] {
        &self.states
    }

    /// Position held after each row: `1` long, `-1` short, `0` flat.
    pub fn positions(&self) -> Vec<i8> {
        self.states.iter().map(|s| s.exposure()).collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Whether the series has no rows.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Number of rows that opened a position.
    pub fn entries(&self) -> usize {
        let mut previous = PositionState::Flat;
        self.states
            .iter()
            .filter(|&&s| {
                let opened = previous == PositionState::Flat && s != PositionState::Flat;
                previous = s;
                opened
            })
            .count()
    }

    /// Table with `date`, `zscore`, `signal`, `state` and `position`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<String> = self.dates.iter().map(|d| d.to_string()).collect();
        let signals: Vec<i32> = self.signals.iter().map(|&s| i32::from(s)).collect();
        let positions: Vec<i32> = self.positions().into_iter().map(i32::from).collect();
        let states: Vec<&str> = self.states.iter().map(|s| s.as_str()).collect();
        Ok(DataFrame::new(vec![
            Column::new(DATE_COLUMN.into(), dates),
            Column::new("zscore".into(), self.zscores.clone()),
            Column::new("signal".into(), signals),
            Column::new("state".into(), states),
            Column::new("position".into(), positions),
        ])?)
    }
}

/// Mean reversion on a spread series.
///
/// Opens a short when the spread's z-score rises above `entry_z` and a long
/// when it falls below `-entry_z`; closes once the z-score comes back inside
/// `exit_z` of zero.
#[derive(Debug, Clone, Default)]
pub struct SpreadReversion {
    config: ReversionConfig,
}

impl SpreadReversion {
    /// Create a new rule with the given configuration.
    #[must_use]
    pub const fn new(config: ReversionConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &ReversionConfig {
        &self.config
    }

    /// Runs the rule and keeps the z-scores and states next to the signals.
    ///
    /// # Errors
    ///
    /// Fails for invalid thresholds or a window that is not shorter than
    /// the spread.
    pub fn run(&self, spread: &TimeSeries) -> Result<SignalSeries> {
        let thresholds = self.config.thresholds()?;
        let zscores = rolling_zscore(spread.values(), self.config.window)?;
        let series = SignalSeries::from_zscores(spread.dates().to_vec(), zscores, thresholds)?;

        tracing::debug!(
            rows = series.len(),
            entries = series.entries(),
            window = self.config.window,
            "spread signals generated"
        );
        Ok(series)
    }
}

impl SignalRule for SpreadReversion {
    fn name(&self) -> &str {
        "spread_reversion"
    }

    fn lookback(&self) -> usize {
        self.config.window
    }

    fn generate(&self, series: &TimeSeries) -> Result<Vec<i8>> {
        Ok(self.run(series)?.signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread(values: Vec<f64>) -> TimeSeries {
        let start = Date::from_ymd_opt(2024, 2, 1).unwrap();
        let dates = (0..values.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        TimeSeries::new("spread", dates, values).unwrap()
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        let parsed: ReversionConfig = serde_json::from_str(r#"{"window": 30}"#).unwrap();
        assert_eq!(parsed.window, 30);
        assert_eq!(parsed.entry_z, 2.0);
        assert!(serde_json::from_str::<ReversionConfig>(r#"{"entry-z": 3.0}"#).is_err());
    }

    #[test]
    fn test_config_defaults_and_validation() {
        let config = ReversionConfig::default();
        assert_eq!(config.window, 20);
        assert!(config.validate().is_ok());

        let bad = ReversionConfig {
            entry_z: 0.5,
            exit_z: 1.0,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(RondaError::InvalidConfig(_))));
        let bad = ReversionConfig {
            window: 1,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(RondaError::InvalidConfig(_))));
    }

    #[test]
    fn test_spike_enters_short_then_exits() {
        let mut values = vec![0.001, -0.001, 0.002, -0.002, 0.001, -0.001];
        values.push(0.05);
        values.extend([0.0, 0.0, 0.0, 0.0, 0.0]);
        let rule = SpreadReversion::new(ReversionConfig {
            window: 5,
            entry_z: 1.5,
            exit_z: 0.5,
        });
        let out = rule.run(&spread(values)).unwrap();

        assert!(out.zscores()[..4].iter().all(Option::is_none));
        assert_eq!(out.signals()[6], -1);
        assert_eq!(out.states()[6], PositionState::ShortSpread);
        assert_eq!(out.entries(), 1);
        // The short is eventually closed with a +1.
        let exit = out.signals()[7..].iter().position(|&s| s == 1);
        assert!(exit.is_some());
        assert_eq!(*out.states().last().unwrap(), PositionState::Flat);
    }

    #[test]
    fn test_window_too_long() {
        let rule = SpreadReversion::new(ReversionConfig {
            window: 4,
            ..Default::default()
        });
        let result = rule.generate(&spread(vec![0.0, 0.1, 0.2, 0.3]));
        assert!(matches!(result, Err(RondaError::InvalidConfig(_))));
    }

    #[test]
    fn test_dataframe_shape() {
        let rule = SpreadReversion::new(ReversionConfig {
            window: 3,
            ..Default::default()
        });
        let out = rule.run(&spread(vec![0.01, -0.02, 0.03, 0.0, 0.01])).unwrap();
        let df = out.to_dataframe().unwrap();
        assert_eq!(df.shape(), (5, 5));
        assert_eq!(df.column("zscore").unwrap().null_count(), 2);
    }
}
