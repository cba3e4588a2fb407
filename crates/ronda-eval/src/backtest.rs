//! Spread backtest with lagged execution and transaction costs.
//!
//! The exposure held during period `t` is the one decided at `t − 1`, so
//! the first period never earns anything. A flat fraction is deducted from
//! a period's return whenever the exposure changes at that period.

use polars::prelude::*;
use ronda_signals::SignalSeries;
use ronda_traits::stats::compound;
use ronda_traits::{
    DATE_COLUMN, Date, Result, RondaError, TRADING_DAYS_PER_YEAR, TimeSeries, ensure_same_index,
};
use serde::{Deserialize, Serialize};

use crate::metrics::{
    annualized_return, annualized_volatility, drawdown_series, max_drawdown, sharpe_ratio,
};

/// Which series drives the exposure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureMode {
    /// The raw signal value, entries and exits alike.
    #[default]
    Signal,
    /// The position re-derived from the state machine.
    Position,
}

/// Backtesting configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestConfig {
    /// Fraction deducted from a period's return per unit of exposure change.
    pub transaction_cost: f64,
    /// Annual risk-free rate subtracted in the Sharpe ratio.
    pub risk_free_rate: f64,
    /// Periods per year used for annualization.
    pub trading_days_per_year: usize,
    /// Exposure series to trade.
    pub exposure: ExposureMode,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            transaction_cost: 0.001,
            risk_free_rate: 0.0,
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
            exposure: ExposureMode::Signal,
        }
    }
}

impl BacktestConfig {
    /// Checks every field against its admissible range.
    pub fn validate(&self) -> Result<()> {
        if !self.transaction_cost.is_finite() || self.transaction_cost < 0.0 {
            return Err(RondaError::InvalidConfig(format!(
                "transaction_cost must be a non-negative number, got {}",
                self.transaction_cost
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(RondaError::InvalidConfig(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        if self.trading_days_per_year == 0 {
            return Err(RondaError::InvalidConfig(
                "trading_days_per_year must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Backtesting results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Date index shared with the spread.
    pub dates: Vec<Date>,
    /// Net return per period
    pub returns: Vec<f64>,
    /// Running product of `1 + return`, starting from 1
    pub cumulative_returns: Vec<f64>,
    /// Sharpe ratio (annualized)
    pub sharpe_ratio: f64,
    /// Maximum drawdown, in `[-1, 0]`
    pub max_drawdown: f64,
    /// Final wealth minus one
    pub total_return: f64,
    /// Annualized mean return
    pub annualized_return: f64,
    /// Annualized volatility
    pub annualized_volatility: f64,
    /// Periods at which the exposure changed
    pub n_trades: usize,
    /// Sum of all cost deductions
    pub total_transaction_costs: f64,
}

impl BacktestResult {
    /// Final wealth multiplier, `1.0` for an empty run.
    pub fn final_cumulative(&self) -> f64 {
        self.cumulative_returns.last().copied().unwrap_or(1.0)
    }

    /// Drawdown from the running peak at every period.
    pub fn drawdown_series(&self) -> Vec<f64> {
        drawdown_series(&self.cumulative_returns)
    }

    /// Cumulative wealth as a named time series.
    pub fn cumulative_series(&self) -> Result<TimeSeries> {
        TimeSeries::new(
            "cumulative_return",
            self.dates.clone(),
            self.cumulative_returns.clone(),
        )
    }

    /// Table with `date`, `return`, `cumulative_return` and `drawdown`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<String> = self.dates.iter().map(|d| d.to_string()).collect();
        Ok(DataFrame::new(vec![
            Column::new(DATE_COLUMN.into(), dates),
            Column::new("return".into(), self.returns.clone()),
            Column::new("cumulative_return".into(), self.cumulative_returns.clone()),
            Column::new("drawdown".into(), self.drawdown_series()),
        ])?)
    }
}

/// Backtesting engine for a spread and its signals.
#[derive(Debug, Clone, Default)]
pub struct SpreadBacktest {
    config: BacktestConfig,
}

impl SpreadBacktest {
    /// Create a new backtest with configuration.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use ronda_eval::{BacktestConfig, SpreadBacktest};
    ///
    /// let backtest = SpreadBacktest::new(BacktestConfig::default());
    /// let result = backtest.run(&spread, &signals)?;
    /// println!("Sharpe Ratio: {:.2}", result.sharpe_ratio);
    /// ```
    pub const fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Runs the backtest of `signals` against `spread`.
    ///
    /// # Errors
    ///
    /// Fails for an invalid configuration, or when the two series do not
    /// share exactly the same date index.
    pub fn run(&self, spread: &TimeSeries, signals: &SignalSeries) -> Result<BacktestResult> {
        ensure_same_index(
            spread.dates(),
            signals.dates(),
            "backtest",
            spread.name(),
            "signals",
        )?;
        let exposure: Vec<i8> = match self.config.exposure {
            ExposureMode::Signal => signals.signals().to_vec(),
            ExposureMode::Position => signals.positions(),
        };
        self.run_exposure(spread, &exposure)
    }

    /// Runs the backtest for an explicit exposure per period.
    pub fn run_exposure(&self, spread: &TimeSeries, exposure: &[i8]) -> Result<BacktestResult> {
        self.config.validate()?;
        if exposure.len() != spread.len() {
            return Err(RondaError::DataContract(format!(
                "backtest: {} exposures for {} spread rows",
                exposure.len(),
                spread.len()
            )));
        }

        let cost = self.config.transaction_cost;
        let mut returns = Vec::with_capacity(spread.len());
        let mut total_transaction_costs = 0.0;
        let mut n_trades = 0;
        let mut previous = 0.0_f64;

        for (t, (&value, &held)) in spread.values().iter().zip(exposure).enumerate() {
            let current = f64::from(held);
            let change = if t == 0 { 0.0 } else { (current - previous).abs() };
            if change > 0.0 {
                n_trades += 1;
            }
            let deduction = change * cost;
            total_transaction_costs += deduction;
            returns.push(previous * value - deduction);
            previous = current;
        }

        let cumulative_returns = compound(&returns);
        let periods = self.config.trading_days_per_year;
        let result = BacktestResult {
            dates: spread.dates().to_vec(),
            sharpe_ratio: sharpe_ratio(&returns, self.config.risk_free_rate, periods),
            max_drawdown: max_drawdown(&cumulative_returns),
            total_return: cumulative_returns.last().map_or(0.0, |c| c - 1.0),
            annualized_return: annualized_return(&returns, periods),
            annualized_volatility: annualized_volatility(&returns, periods),
            n_trades,
            total_transaction_costs,
            returns,
            cumulative_returns,
        };

        tracing::info!(
            periods = result.returns.len(),
            trades = result.n_trades,
            sharpe = result.sharpe_ratio,
            max_drawdown = result.max_drawdown,
            total_return = result.total_return,
            "backtest complete"
        );
        Ok(result)
    }
}

/// Final cumulative return of a single-instrument signal series.
///
/// The daily close-to-close return is multiplied by the previous day's
/// signal and compounded; no transaction cost is charged.
pub fn backtest_price_signals(closes: &TimeSeries, signals: &[i8]) -> Result<f64> {
    if signals.len() != closes.len() {
        return Err(RondaError::DataContract(format!(
            "price backtest: {} signals for {} closes",
            signals.len(),
            closes.len()
        )));
    }
    let prices = closes.values();
    let mut strategy = Vec::with_capacity(prices.len().saturating_sub(1));
    for t in 1..prices.len() {
        if prices[t - 1] <= 0.0 {
            return Err(RondaError::DataContract(format!(
                "price backtest: non-positive close {} on {}",
                prices[t - 1],
                closes.dates()[t - 1]
            )));
        }
        let daily = prices[t] / prices[t - 1] - 1.0;
        strategy.push(f64::from(signals[t - 1]) * daily);
    }
    Ok(compound(&strategy).last().map_or(0.0, |c| c - 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ronda_signals::Thresholds;

    fn dates(n: usize) -> Vec<Date> {
        let start = Date::from_ymd_opt(2024, 4, 1).unwrap();
        (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect()
    }

    fn spread(values: Vec<f64>) -> TimeSeries {
        TimeSeries::new("spread", dates(values.len()), values).unwrap()
    }

    fn signal_series(z: &[f64]) -> SignalSeries {
        SignalSeries::from_zscores(
            dates(z.len()),
            z.iter().copied().map(Some).collect(),
            Thresholds::new(2.0, 0.5).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(BacktestConfig::default().validate().is_ok());
        let bad = BacktestConfig {
            transaction_cost: -0.1,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = BacktestConfig {
            trading_days_per_year: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_lagged_returns_and_costs() {
        let backtest = SpreadBacktest::new(BacktestConfig {
            transaction_cost: 0.001,
            ..Default::default()
        });
        let s = spread(vec![0.01, 0.02, -0.01, 0.03]);
        let result = backtest.run_exposure(&s, &[1, 1, -1, 0]).unwrap();

        // t0: no prior exposure, no cost on the first row
        // t1: 1 * 0.02
        // t2: 1 * -0.01 minus 2 * cost
        // t3: -1 * 0.03 minus 1 * cost
        assert_abs_diff_eq!(result.returns[0], 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(result.returns[1], 0.02, epsilon = 1e-15);
        assert_abs_diff_eq!(result.returns[2], -0.012, epsilon = 1e-15);
        assert_abs_diff_eq!(result.returns[3], -0.031, epsilon = 1e-15);
        assert_eq!(result.n_trades, 2);
        assert_abs_diff_eq!(result.total_transaction_costs, 0.003, epsilon = 1e-15);

        let expected_final = 1.0 * 1.02 * 0.988 * 0.969;
        assert_abs_diff_eq!(result.final_cumulative(), expected_final, epsilon = 1e-12);
        assert_abs_diff_eq!(result.total_return, expected_final - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_exposure_modes_differ() {
        let z = [0.0, 2.5, 2.0, -0.2, -2.6, 0.1];
        let signals = signal_series(&z);
        let s = spread(vec![0.0, 0.01, -0.02, 0.01, 0.0, 0.02]);

        let by_signal = SpreadBacktest::new(BacktestConfig {
            transaction_cost: 0.0,
            ..Default::default()
        })
        .run(&s, &signals)
        .unwrap();
        let by_position = SpreadBacktest::new(BacktestConfig {
            transaction_cost: 0.0,
            exposure: ExposureMode::Position,
            ..Default::default()
        })
        .run(&s, &signals)
        .unwrap();

        // Signals [0, -1, 0, 1, 1, -1] vs positions [0, -1, -1, 0, 1, 0].
        assert_abs_diff_eq!(by_signal.returns[2], 0.02, epsilon = 1e-15);
        assert_abs_diff_eq!(by_signal.returns[3], 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(by_signal.returns[5], 0.02, epsilon = 1e-15);
        assert_abs_diff_eq!(by_position.returns[2], 0.02, epsilon = 1e-15);
        assert_abs_diff_eq!(by_position.returns[3], -0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(by_position.returns[5], 0.02, epsilon = 1e-15);
    }

    #[test]
    fn test_index_mismatch() {
        let signals = signal_series(&[0.0, 0.0, 0.0]);
        let s = TimeSeries::new("spread", dates(4)[1..].to_vec(), vec![0.0; 3]).unwrap();
        let result = SpreadBacktest::default().run(&s, &signals);
        assert!(matches!(result, Err(RondaError::DataContract(_))));
    }

    #[test]
    fn test_flat_run() {
        let s = spread(vec![0.01, -0.02, 0.03]);
        let result = SpreadBacktest::default().run_exposure(&s, &[0, 0, 0]).unwrap();
        assert_eq!(result.sharpe_ratio, 0.0);
        assert_eq!(result.max_drawdown, 0.0);
        assert_eq!(result.cumulative_returns, vec![1.0, 1.0, 1.0]);
        assert_eq!(result.to_dataframe().unwrap().shape(), (3, 4));
    }

    #[test]
    fn test_price_backtest() {
        let closes = TimeSeries::new("close", dates(4), vec![100.0, 110.0, 99.0, 108.9]).unwrap();
        // Long day 1, short day 2, flat day 3.
        let total = backtest_price_signals(&closes, &[1, -1, 0, 0]).unwrap();
        assert_abs_diff_eq!(total, 1.1 * 1.1 - 1.0, epsilon = 1e-12);

        assert!(backtest_price_signals(&closes, &[1, 0]).is_err());
    }
}
