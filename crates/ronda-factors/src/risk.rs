//! Risk analytics on a return matrix and its factor decomposition.
//!
//! - annualized portfolio volatility from the sample covariance matrix
//! - top contributing assets per principal component
//! - parametric (normal) Value-at-Risk of the equal-weight portfolio

use ndarray::{Array1, Axis};
use polars::prelude::*;
use ronda_traits::stats::{MIN_STD_THRESHOLD, mean, sample_std};
use ronda_traits::{Result, ReturnMatrix, RondaError, Symbol, TRADING_DAYS_PER_YEAR};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::linalg::covariance_matrix;
use crate::pca::FactorSet;

/// Configuration for the risk stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskConfig {
    /// Number of top contributing assets reported per component.
    pub top_n: usize,
    /// VaR confidence level, in (0, 1).
    pub confidence_level: f64,
    /// VaR horizon in trading days.
    pub time_horizon: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            confidence_level: 0.95,
            time_horizon: 1,
        }
    }
}

impl RiskConfig {
    /// Checks every field against its admissible range.
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(RondaError::InvalidConfig(
                "top_n must be a positive integer".to_string(),
            ));
        }
        validate_confidence(self.confidence_level)?;
        if self.time_horizon == 0 {
            return Err(RondaError::InvalidConfig(
                "time_horizon must be at least one day".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_confidence(confidence_level: f64) -> Result<()> {
    if confidence_level > 0.0 && confidence_level < 1.0 {
        Ok(())
    } else {
        Err(RondaError::InvalidConfig(format!(
            "confidence_level must lie in (0, 1), got {confidence_level}"
        )))
    }
}

/// Annualized volatility of a weighted portfolio.
///
/// Computes `sqrt(wᵀ Σ w)` where `Σ` is the sample covariance of the daily
/// returns scaled by 252. Without weights the portfolio is equal-weighted.
///
/// # Errors
///
/// Fails when the weight vector length differs from the asset count or
/// when fewer than two dates are available.
pub fn portfolio_volatility(returns: &ReturnMatrix, weights: Option<&[f64]>) -> Result<f64> {
    let n_assets = returns.n_assets();
    let w = match weights {
        Some(w) if w.len() != n_assets => {
            return Err(RondaError::DataContract(format!(
                "portfolio volatility: {} weights for {} assets",
                w.len(),
                n_assets
            )));
        }
        Some(w) => Array1::from_vec(w.to_vec()),
        None => Array1::from_elem(n_assets, 1.0 / n_assets as f64),
    };

    let annualized = covariance_matrix(returns.values())? * TRADING_DAYS_PER_YEAR as f64;
    let variance = w.dot(&annualized.dot(&w));
    let volatility = variance.max(0.0).sqrt();

    tracing::debug!(volatility, assets = n_assets, "portfolio volatility computed");
    Ok(volatility)
}

/// Top contributing assets of one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentContributors {
    /// Component label.
    pub component: String,
    /// Assets ranked by absolute loading, largest first.
    pub assets: Vec<Symbol>,
}

/// Per-component contributors plus the cumulative explained variance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFactorReport {
    /// Top contributors, one entry per component.
    pub top_contributors: Vec<ComponentContributors>,
    /// Running explained-variance ratio, keyed by component label.
    pub cumulative_variance: Vec<(String, f64)>,
}

impl RiskFactorReport {
    /// Contributors table: one column per component, one row per rank.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .top_contributors
            .iter()
            .map(|c| Column::new(c.component.as_str().into(), c.assets.clone()))
            .collect();
        Ok(DataFrame::new(columns)?)
    }

    /// Cumulative variance table with `component` and `cumulative_variance`.
    pub fn cumulative_variance_frame(&self) -> Result<DataFrame> {
        let (names, values): (Vec<String>, Vec<f64>) =
            self.cumulative_variance.iter().cloned().unzip();
        Ok(DataFrame::new(vec![
            Column::new("component".into(), names),
            Column::new("cumulative_variance".into(), values),
        ])?)
    }
}

/// Ranks assets by absolute loading for every component.
///
/// Ties keep the original column order. When `top_n` exceeds the number of
/// assets every asset is listed.
pub fn analyze_risk_factors(factors: &FactorSet, top_n: usize) -> Result<RiskFactorReport> {
    if top_n == 0 {
        return Err(RondaError::InvalidConfig(
            "top_n must be a positive integer".to_string(),
        ));
    }

    let assets = factors.assets();
    let top_contributors = factors
        .components()
        .iter()
        .map(|component| {
            let magnitude = component.loadings.mapv(f64::abs);
            let mut order: Vec<usize> = (0..assets.len()).collect();
            order.sort_by(|&a, &b| magnitude[b].total_cmp(&magnitude[a]));
            ComponentContributors {
                component: component.name.clone(),
                assets: order
                    .into_iter()
                    .take(top_n)
                    .map(|i| assets[i].clone())
                    .collect(),
            }
        })
        .collect();

    let cumulative_variance = factors
        .components()
        .iter()
        .map(|c| c.name.clone())
        .zip(factors.cumulative_explained_variance())
        .collect();

    tracing::debug!(top_n, components = factors.len(), "risk factors analyzed");
    Ok(RiskFactorReport {
        top_contributors,
        cumulative_variance,
    })
}

/// Parametric Value-at-Risk of the equal-weight portfolio.
///
/// With `μ` and `σ` the mean and sample standard deviation of the
/// equal-weight daily return and `z` the standard-normal quantile at
/// `confidence_level`, reports `μ − z·σ·√horizon`. A loss shows up as a
/// negative return.
///
/// # Errors
///
/// Fails for a confidence level outside (0, 1), a zero horizon, fewer
/// than two dates, or an equal-weight return with no dispersion
/// ([`RondaError::Degenerate`]).
pub fn value_at_risk(
    returns: &ReturnMatrix,
    confidence_level: f64,
    time_horizon: usize,
) -> Result<f64> {
    validate_confidence(confidence_level)?;
    if time_horizon == 0 {
        return Err(RondaError::InvalidConfig(
            "time_horizon must be at least one day".to_string(),
        ));
    }

    let portfolio: Vec<f64> = returns
        .values()
        .mean_axis(Axis(1))
        .map(|m| m.to_vec())
        .unwrap_or_default();
    let (mu, sigma) = match (mean(&portfolio), sample_std(&portfolio)) {
        (Some(mu), Some(sigma)) => (mu, sigma),
        _ => {
            return Err(RondaError::InsufficientData(format!(
                "value at risk needs at least 2 dates, got {}",
                portfolio.len()
            )));
        }
    };
    if !sigma.is_finite() || sigma <= MIN_STD_THRESHOLD {
        return Err(RondaError::Degenerate(format!(
            "value at risk: equal-weight portfolio return has standard deviation {sigma}"
        )));
    }

    let z = standard_normal_quantile(confidence_level)?;
    let var = mu - z * sigma * (time_horizon as f64).sqrt();

    tracing::debug!(var, confidence_level, time_horizon, "value at risk computed");
    Ok(var)
}

/// Inverse CDF of the standard normal distribution.
pub fn standard_normal_quantile(p: f64) -> Result<f64> {
    let normal =
        Normal::new(0.0, 1.0).map_err(|e| RondaError::Other(format!("standard normal: {e}")))?;
    Ok(normal.inverse_cdf(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pca::{DecompositionConfig, decompose};
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};
    use ronda_traits::Date;

    fn matrix(values: Array2<f64>) -> ReturnMatrix {
        let dates = (0..values.nrows())
            .map(|i| Date::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64))
            .collect();
        let assets = (0..values.ncols()).map(|j| format!("A{j}")).collect();
        ReturnMatrix::new(dates, assets, values).unwrap()
    }

    #[test]
    fn test_risk_config_default() {
        let config = RiskConfig::default();
        assert_eq!(config.top_n, 5);
        assert_abs_diff_eq!(config.confidence_level, 0.95);
        assert_eq!(config.time_horizon, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_risk_config_invalid() {
        let config = RiskConfig {
            confidence_level: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = RiskConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_portfolio_volatility_single_asset() {
        let m = matrix(array![[0.01], [-0.01], [0.02], [0.0]]);
        let daily = sample_std(&[0.01, -0.01, 0.02, 0.0]).unwrap();
        let vol = portfolio_volatility(&m, None).unwrap();
        assert_abs_diff_eq!(vol, daily * 252.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_portfolio_volatility_weights() {
        let m = matrix(array![[0.01, 0.03], [-0.01, 0.01], [0.02, -0.02]]);
        // All weight on the second asset equals its own annualized volatility.
        let vol = portfolio_volatility(&m, Some(&[0.0, 1.0])).unwrap();
        let daily = sample_std(&[0.03, 0.01, -0.02]).unwrap();
        assert_abs_diff_eq!(vol, daily * 252.0_f64.sqrt(), epsilon = 1e-12);

        let result = portfolio_volatility(&m, Some(&[1.0]));
        assert!(matches!(result, Err(RondaError::DataContract(_))));
    }

    #[test]
    fn test_top_contributors_ranked_by_magnitude() {
        // Columns are 1x, 2x and 0.5x of one driver.
        let m = matrix(array![
            [0.01, 0.02, 0.005],
            [-0.01, -0.02, -0.005],
            [0.02, 0.04, 0.01]
        ]);
        let factors = decompose(&m, &DecompositionConfig::with_components(1)).unwrap();
        let report = analyze_risk_factors(&factors, 2).unwrap();

        assert_eq!(report.top_contributors.len(), 1);
        assert_eq!(report.top_contributors[0].component, "PC1");
        assert_eq!(report.top_contributors[0].assets, vec!["A1", "A0"]);
        assert_eq!(report.cumulative_variance[0].0, "PC1");
        assert_abs_diff_eq!(report.cumulative_variance[0].1, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_top_contributors_frames() {
        let m = matrix(array![[0.01, 0.03], [-0.01, 0.01], [0.02, -0.02], [0.0, 0.01]]);
        let factors = decompose(&m, &DecompositionConfig::default()).unwrap();
        let report = analyze_risk_factors(&factors, 10).unwrap();

        let table = report.to_dataframe().unwrap();
        assert_eq!(table.width(), 2);
        assert_eq!(table.height(), 2);
        assert_eq!(report.cumulative_variance_frame().unwrap().height(), 2);
        assert!(analyze_risk_factors(&factors, 0).is_err());
    }

    #[test]
    fn test_value_at_risk_formula() {
        let m = matrix(array![[0.01, 0.03], [-0.01, 0.01], [0.02, -0.02], [0.0, 0.01]]);
        let portfolio = [0.02, 0.0, 0.0, 0.005];
        let mu = mean(&portfolio).unwrap();
        let sigma = sample_std(&portfolio).unwrap();

        let var = value_at_risk(&m, 0.95, 4).unwrap();
        let z = 1.6448536269514722;
        assert_abs_diff_eq!(var, mu - z * sigma * 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_value_at_risk_is_deterministic() {
        let m = matrix(array![[0.01, 0.03], [-0.01, 0.01], [0.02, -0.02]]);
        let a = value_at_risk(&m, 0.99, 1).unwrap();
        let b = value_at_risk(&m, 0.99, 1).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_value_at_risk_invalid_inputs() {
        let m = matrix(array![[0.01, 0.03], [-0.01, 0.01]]);
        assert!(matches!(
            value_at_risk(&m, 1.5, 1),
            Err(RondaError::InvalidConfig(_))
        ));
        assert!(matches!(
            value_at_risk(&m, 0.95, 0),
            Err(RondaError::InvalidConfig(_))
        ));

        let single = matrix(array![[0.01, 0.03]]);
        assert!(matches!(
            value_at_risk(&single, 0.95, 1),
            Err(RondaError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_value_at_risk_flat_portfolio() {
        let constant = matrix(Array2::from_elem((5, 2), 0.01));
        assert!(matches!(
            value_at_risk(&constant, 0.95, 1),
            Err(RondaError::Degenerate(_))
        ));

        // Offsetting assets leave the equal-weight portfolio flat.
        let hedged = matrix(array![[0.01, -0.01], [-0.02, 0.02], [0.03, -0.03]]);
        assert!(matches!(
            value_at_risk(&hedged, 0.99, 5),
            Err(RondaError::Degenerate(_))
        ));
    }

    #[test]
    fn test_standard_normal_quantile() {
        assert_abs_diff_eq!(standard_normal_quantile(0.5).unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            standard_normal_quantile(0.975).unwrap(),
            1.959963984540054,
            epsilon = 1e-8
        );
    }
}
