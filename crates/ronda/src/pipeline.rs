//! End-to-end research run: decomposition, risk, basket, signals, backtest.

use ronda_combine::{BasketWeights, basket_returns};
use ronda_eval::{BacktestConfig, BacktestResult, ExposureMode, SpreadBacktest};
use ronda_factors::{
    ComponentRegression, DecompositionConfig, FactorSet, RiskConfig, RiskFactorReport,
    analyze_risk_factors, decompose, portfolio_volatility, regress_on_components, value_at_risk,
};
use ronda_signals::{ReversionConfig, SignalSeries, SpreadReversion, compute_spread};
use ronda_traits::{Date, Result, ReturnMatrix, RondaError, TimeSeries};
use serde::{Deserialize, Serialize};

/// Sample restriction and cleaning options of the input tables.
///
/// Only the date bounds are applied here (by the CLI loader). The cleaning
/// keys are accepted so a full run file parses, and are left to whatever
/// produced the clean return matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// First date kept, inclusive.
    pub start_date: Option<Date>,
    /// Last date kept, inclusive.
    pub end_date: Option<Date>,
    /// Missing-value fill method used upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_method: Option<String>,
    /// Whether upstream cleaning drops incomplete rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropna: Option<bool>,
    /// Price field the returns were computed from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_col: Option<String>,
}

impl DataConfig {
    /// Rejects an inverted date range.
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && start > end
        {
            return Err(RondaError::InvalidConfig(format!(
                "data.start_date {start} is after data.end_date {end}"
            )));
        }
        Ok(())
    }
}

/// Spread rule, benchmark choice and trading costs.
///
/// Signal and backtest settings live in one section, the way run files
/// group them; [`StrategyConfig::reversion`] and
/// [`StrategyConfig::backtest`] split them for the engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyConfig {
    /// Rolling z-score window.
    pub window: usize,
    /// Entry threshold.
    pub entry_z: f64,
    /// Exit threshold.
    pub exit_z: f64,
    /// Benchmark column to read when the benchmark table has several.
    pub index_ticker: Option<String>,
    /// Fraction deducted per unit of exposure change.
    pub transaction_cost: f64,
    /// Annual risk-free rate used in the Sharpe ratio.
    pub risk_free_rate: f64,
    /// Periods per year used for annualization.
    pub trading_days_per_year: usize,
    /// Exposure series the backtest trades.
    pub exposure: ExposureMode,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::from_parts(ReversionConfig::default(), BacktestConfig::default())
    }
}

impl StrategyConfig {
    /// Joins a reversion rule and a backtest configuration.
    pub const fn from_parts(reversion: ReversionConfig, backtest: BacktestConfig) -> Self {
        Self {
            window: reversion.window,
            entry_z: reversion.entry_z,
            exit_z: reversion.exit_z,
            index_ticker: None,
            transaction_cost: backtest.transaction_cost,
            risk_free_rate: backtest.risk_free_rate,
            trading_days_per_year: backtest.trading_days_per_year,
            exposure: backtest.exposure,
        }
    }

    /// Signal-rule part.
    pub const fn reversion(&self) -> ReversionConfig {
        ReversionConfig {
            window: self.window,
            entry_z: self.entry_z,
            exit_z: self.exit_z,
        }
    }

    /// Backtest part.
    pub const fn backtest(&self) -> BacktestConfig {
        BacktestConfig {
            transaction_cost: self.transaction_cost,
            risk_free_rate: self.risk_free_rate,
            trading_days_per_year: self.trading_days_per_year,
            exposure: self.exposure,
        }
    }

    /// Validates both parts.
    pub fn validate(&self) -> Result<()> {
        self.reversion().validate()?;
        self.backtest().validate()
    }
}

/// Where the CLI writes its result tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Output directory, created when missing.
    pub results_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: "results".to_string(),
        }
    }
}

/// Every tunable of one research run, grouped by stage.
///
/// Missing sections and keys take their defaults; unknown sections or keys
/// are rejected so a misspelt option cannot fall back silently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResearchConfig {
    /// Sample bounds and upstream cleaning options.
    pub data: DataConfig,
    /// Component selection.
    pub pca: DecompositionConfig,
    /// Contributors and VaR parameters.
    pub risk: RiskConfig,
    /// Spread rule, benchmark and trading costs.
    pub strategy: StrategyConfig,
    /// Result location.
    pub outputs: OutputConfig,
}

impl ResearchConfig {
    /// Validates every section; called once before any computation.
    pub fn validate(&self) -> Result<()> {
        self.data.validate()?;
        self.pca.validate()?;
        self.risk.validate()?;
        self.strategy.validate()
    }
}

/// Headline figures of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchSummary {
    /// Dates in the return matrix.
    pub n_dates: usize,
    /// Assets in the return matrix.
    pub n_assets: usize,
    /// Retained components.
    pub n_components: usize,
    /// Share of variance explained by the retained components.
    pub explained_variance: f64,
    /// Annualized equal-weight portfolio volatility.
    pub portfolio_volatility: f64,
    /// VaR confidence level.
    pub confidence_level: f64,
    /// VaR horizon in days.
    pub time_horizon: usize,
    /// Parametric Value-at-Risk.
    pub value_at_risk: f64,
    /// R² of the benchmark regressed on the retained components.
    pub benchmark_r_squared: Option<f64>,
    /// Annualized Sharpe ratio of the spread strategy.
    pub sharpe_ratio: f64,
    /// Maximum drawdown of the spread strategy.
    pub max_drawdown: f64,
    /// Final wealth minus one.
    pub total_return: f64,
    /// Exposure changes during the backtest.
    pub n_trades: usize,
}

/// Everything a research run produces.
#[derive(Debug, Clone)]
pub struct ResearchReport {
    /// Retained principal components.
    pub factors: FactorSet,
    /// Top contributors and cumulative variance.
    pub risk: RiskFactorReport,
    /// Annualized equal-weight portfolio volatility.
    pub portfolio_volatility: f64,
    /// Parametric Value-at-Risk.
    pub value_at_risk: f64,
    /// Benchmark regressed on the component scores, when there are more
    /// dates than parameters.
    pub benchmark_regression: Option<ComponentRegression>,
    /// Weights of the dominant-factor basket.
    pub weights: BasketWeights,
    /// Basket return series.
    pub basket: TimeSeries,
    /// Basket minus benchmark.
    pub spread: TimeSeries,
    /// Z-scores, signals and states over the spread.
    pub signals: SignalSeries,
    /// Backtest of the signals on the spread.
    pub backtest: BacktestResult,
    config: ResearchConfig,
}

impl ResearchReport {
    /// Configuration the run used.
    pub const fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Headline figures.
    pub fn summary(&self) -> ResearchSummary {
        ResearchSummary {
            n_dates: self.factors.dates().len(),
            n_assets: self.factors.assets().len(),
            n_components: self.factors.len(),
            explained_variance: self
                .factors
                .cumulative_explained_variance()
                .last()
                .copied()
                .unwrap_or(0.0),
            portfolio_volatility: self.portfolio_volatility,
            confidence_level: self.config.risk.confidence_level,
            time_horizon: self.config.risk.time_horizon,
            value_at_risk: self.value_at_risk,
            benchmark_r_squared: self.benchmark_regression.as_ref().map(|r| r.r_squared),
            sharpe_ratio: self.backtest.sharpe_ratio,
            max_drawdown: self.backtest.max_drawdown,
            total_return: self.backtest.total_return,
            n_trades: self.backtest.n_trades,
        }
    }
}

/// Runs every stage on one return matrix and its benchmark.
///
/// The configuration is validated up front. The benchmark must carry the
/// return matrix's exact date index.
///
/// # Errors
///
/// Propagates the first failing stage's error unchanged.
pub fn run_pipeline(
    returns: &ReturnMatrix,
    benchmark: &TimeSeries,
    config: &ResearchConfig,
) -> Result<ResearchReport> {
    config.validate()?;
    tracing::info!(
        dates = returns.n_dates(),
        assets = returns.n_assets(),
        "starting research run"
    );

    let factors = decompose(returns, &config.pca)?;
    let volatility = portfolio_volatility(returns, None)?;
    let risk = analyze_risk_factors(&factors, config.risk.top_n)?;
    let var = value_at_risk(returns, config.risk.confidence_level, config.risk.time_horizon)?;
    tracing::info!(
        volatility,
        var,
        confidence_level = config.risk.confidence_level,
        time_horizon = config.risk.time_horizon,
        "risk analysis complete"
    );

    let benchmark_regression = if returns.n_dates() > factors.len() + 1 {
        match regress_on_components(&factors, benchmark, None) {
            Ok(fit) => Some(fit),
            Err(RondaError::Degenerate(reason)) => {
                tracing::warn!(%reason, "benchmark regression skipped");
                None
            }
            Err(e) => return Err(e),
        }
    } else {
        tracing::debug!(
            components = factors.len(),
            "too few dates to regress the benchmark on every component"
        );
        None
    };

    let weights = BasketWeights::dominant(&factors)?;
    let basket = basket_returns(returns, &weights)?;
    let spread = compute_spread(&basket, benchmark)?;
    let signals = SpreadReversion::new(config.strategy.reversion()).run(&spread)?;
    let backtest = SpreadBacktest::new(config.strategy.backtest()).run(&spread, &signals)?;

    Ok(ResearchReport {
        factors,
        risk,
        portfolio_volatility: volatility,
        value_at_risk: var,
        benchmark_regression,
        weights,
        basket,
        spread,
        signals,
        backtest,
        config: config.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ResearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.risk.top_n, 5);
        assert_eq!(config.strategy.window, 20);
        assert_eq!(config.strategy.backtest(), BacktestConfig::default());
        assert_eq!(config.strategy.reversion(), ReversionConfig::default());
        assert_eq!(config.outputs.results_dir, "results");
    }

    #[test]
    fn test_conflicting_selection_is_rejected() {
        let config = ResearchConfig {
            pca: DecompositionConfig {
                n_components: Some(2),
                variance_threshold: Some(0.9),
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RondaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_yaml_sections_default() {
        let yaml = "
pca:
  variance_threshold: 0.9
strategy:
  window: 30
  entry_z: 1.5
  transaction_cost: 0.002
  exposure: position
";
        let config: ResearchConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.pca.variance_threshold, Some(0.9));
        assert_eq!(config.pca.n_components, None);
        assert_eq!(config.strategy.window, 30);
        assert_eq!(config.strategy.exit_z, 0.5);
        assert_eq!(config.risk, RiskConfig::default());
        assert_eq!(config.strategy.backtest().transaction_cost, 0.002);
        assert_eq!(config.strategy.backtest().exposure, ExposureMode::Position);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_run_file_layout() {
        let yaml = "
data:
  start_date: '2020-01-01'
  end_date: '2023-12-31'
  fill_method: ffill
  dropna: true
  price_col: Adj Close
pca:
  variance_threshold: 0.85
risk:
  top_n: 5
  confidence_level: 0.99
  time_horizon: 10
strategy:
  index_ticker: '^GSPC'
  window: 30
  entry_z: 2.5
  exit_z: 0.25
  transaction_cost: 0.01
  risk_free_rate: 0.03
outputs:
  results_dir: out
";
        let config: ResearchConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.data.start_date, Date::from_ymd_opt(2020, 1, 1));
        assert_eq!(config.data.end_date, Date::from_ymd_opt(2023, 12, 31));
        assert_eq!(config.risk.time_horizon, 10);
        assert_eq!(config.strategy.index_ticker.as_deref(), Some("^GSPC"));

        let backtest = config.strategy.backtest();
        assert_eq!(backtest.transaction_cost, 0.01);
        assert_eq!(backtest.risk_free_rate, 0.03);
        let reversion = config.strategy.reversion();
        assert_eq!(reversion.window, 30);
        assert_eq!(reversion.entry_z, 2.5);
        assert_eq!(reversion.exit_z, 0.25);
        assert_eq!(config.outputs.results_dir, "out");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let misspelt = serde_yaml::from_str::<ResearchConfig>("strategy:\n  entry-z: 3.0\n");
        assert!(misspelt.is_err());

        let unknown_section =
            serde_yaml::from_str::<ResearchConfig>("backtest:\n  transaction_cost: 0.01\n");
        assert!(unknown_section.is_err());

        let nested = serde_yaml::from_str::<ResearchConfig>("risk:\n  topn: 3\n");
        assert!(nested.is_err());
    }

    #[test]
    fn test_inverted_date_range_is_rejected() {
        let config: ResearchConfig = serde_yaml::from_str(
            "data:\n  start_date: '2024-01-01'\n  end_date: '2023-01-01'\n",
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(RondaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_strategy_parts_round_trip() {
        let reversion = ReversionConfig {
            window: 10,
            entry_z: 1.0,
            exit_z: 0.0,
        };
        let backtest = BacktestConfig {
            transaction_cost: 0.0,
            ..Default::default()
        };
        let strategy = StrategyConfig::from_parts(reversion, backtest);
        assert_eq!(strategy.reversion(), reversion);
        assert_eq!(strategy.backtest(), backtest);
    }
}
