//! End-to-end research run on a synthetic single-factor market.

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use ronda::eval::BacktestConfig;
use ronda::factors::DecompositionConfig;
use ronda::signals::ReversionConfig;
use ronda::{
    Date, ResearchConfig, ReturnMatrix, RondaError, StrategyConfig, TimeSeries, run_pipeline,
};

const N_DATES: usize = 200;

fn dates(offset: i64) -> Vec<Date> {
    let start = Date::from_ymd_opt(2020, 1, 1).unwrap();
    (0..N_DATES as i64)
        .map(|i| start + chrono::Duration::days(i + offset))
        .collect()
}

fn market_factor(t: usize) -> f64 {
    let t = t as f64;
    0.01 * (t * 0.31).sin() + 0.004 * (t * 0.07).cos()
}

fn returns() -> ReturnMatrix {
    let betas = [1.1, 0.8, 1.3, 0.9, 1.0, 0.7];
    let values = Array2::from_shape_fn((N_DATES, betas.len()), |(t, j)| {
        betas[j] * market_factor(t) + 0.002 * ((t * (j + 3)) as f64 * 0.53 + j as f64).sin()
    });
    let assets = (0..betas.len()).map(|j| format!("S{j}")).collect();
    ReturnMatrix::new(dates(0), assets, values).unwrap()
}

fn benchmark(offset: i64) -> TimeSeries {
    let values = (0..N_DATES)
        .map(|t| market_factor(t) + 0.001 * (t as f64 * 1.9).cos())
        .collect();
    TimeSeries::new("index", dates(offset), values).unwrap()
}

fn config() -> ResearchConfig {
    ResearchConfig {
        pca: DecompositionConfig::with_variance_threshold(0.9),
        strategy: StrategyConfig::from_parts(
            ReversionConfig {
                window: 20,
                entry_z: 1.5,
                exit_z: 0.5,
            },
            BacktestConfig::default(),
        ),
        ..Default::default()
    }
}

#[test]
fn full_run_produces_consistent_outputs() {
    let returns = returns();
    let report = run_pipeline(&returns, &benchmark(0), &config()).unwrap();

    // One common factor dominates.
    assert_eq!(report.factors.len(), 1);
    assert_abs_diff_eq!(report.weights.gross_exposure(), 1.0, epsilon = 1e-12);

    assert_eq!(report.basket.dates(), returns.dates());
    assert_eq!(report.spread.len(), N_DATES);
    assert_eq!(report.signals.len(), N_DATES);
    assert_eq!(report.backtest.cumulative_returns.len(), N_DATES);

    assert!(report.portfolio_volatility > 0.0);
    assert!(report.value_at_risk < 0.0);
    assert!((-1.0..=0.0).contains(&report.backtest.max_drawdown));

    let summary = report.summary();
    assert_eq!(summary.n_assets, 6);
    assert_eq!(summary.n_components, 1);
    assert!(summary.explained_variance >= 0.9);
    assert!(summary.benchmark_r_squared.unwrap() > 0.5);
    assert_eq!(report.risk.top_contributors[0].assets[0], "S2");
}

#[test]
fn reruns_are_identical() {
    let returns = returns();
    let a = run_pipeline(&returns, &benchmark(0), &config()).unwrap();
    let b = run_pipeline(&returns, &benchmark(0), &config()).unwrap();
    assert_eq!(a.backtest, b.backtest);
    assert_eq!(a.signals, b.signals);
    assert_eq!(a.summary(), b.summary());
}

#[test]
fn shifted_benchmark_is_a_contract_violation() {
    let result = run_pipeline(&returns(), &benchmark(1), &config());
    assert!(matches!(result, Err(RondaError::DataContract(_))));
}

#[test]
fn invalid_config_fails_before_computation() {
    let mut config = config();
    config.risk.confidence_level = 1.2;
    let result = run_pipeline(&returns(), &benchmark(0), &config);
    assert!(matches!(result, Err(RondaError::InvalidConfig(_))));
}
