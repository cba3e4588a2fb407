//! Ordinary least squares of a market series on component scores.

use ndarray::{Array1, Array2};
use ronda_traits::{Result, RondaError, TimeSeries, ensure_same_index};
use serde::Serialize;

use crate::linalg::solve;
use crate::pca::{Component, FactorSet};

/// Fitted linear model `market ≈ intercept + Σ βᵢ · scoreᵢ`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRegression {
    /// Regressor labels, in coefficient order.
    pub components: Vec<String>,
    /// Slope per regressor.
    pub coefficients: Vec<f64>,
    /// Constant term.
    pub intercept: f64,
    /// Coefficient of determination of the in-sample fit.
    pub r_squared: f64,
}

impl ComponentRegression {
    /// Fitted values for the given regressor rows.
    pub fn predict(&self, rows: &Array2<f64>) -> Array1<f64> {
        rows.dot(&Array1::from_vec(self.coefficients.clone())) + self.intercept
    }
}

/// Regresses `market` on the score series of the selected components.
///
/// `components` defaults to every component of the set. The market series
/// must be indexed by exactly the dates the decomposition was fitted on.
///
/// # Errors
///
/// - index mismatch: [`RondaError::DataContract`]
/// - unknown component label: [`RondaError::MissingColumn`]
/// - fewer observations than parameters or collinear regressors:
///   [`RondaError::InsufficientData`] / [`RondaError::Degenerate`]
pub fn regress_on_components(
    factors: &FactorSet,
    market: &TimeSeries,
    components: Option<&[&str]>,
) -> Result<ComponentRegression> {
    ensure_same_index(
        factors.dates(),
        market.dates(),
        "component regression",
        "factor scores",
        market.name(),
    )?;

    let selected: Vec<&Component> = match components {
        Some(names) => names
            .iter()
            .map(|name| {
                factors
                    .component(name)
                    .ok_or_else(|| RondaError::MissingColumn((*name).to_string()))
            })
            .collect::<Result<_>>()?,
        None => factors.components().iter().collect(),
    };

    let n = market.len();
    let p = selected.len() + 1;
    if n <= p {
        return Err(RondaError::InsufficientData(format!(
            "regression with {p} parameters needs more than {p} observations, got {n}"
        )));
    }

    let mut design = Array2::<f64>::ones((n, p));
    for (j, component) in selected.iter().enumerate() {
        design.column_mut(j + 1).assign(&component.scores);
    }
    let y = Array1::from_vec(market.values().to_vec());

    let xtx = design.t().dot(&design);
    let xty = design.t().dot(&y);
    let beta = solve(&xtx, &xty)?;

    let fitted = design.dot(&beta);
    let y_mean = y.mean().unwrap_or(0.0);
    let ss_res: f64 = y.iter().zip(fitted.iter()).map(|(a, b)| (a - b).powi(2)).sum();
    let ss_tot: f64 = y.iter().map(|a| (a - y_mean).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    tracing::info!(
        regressors = selected.len(),
        observations = n,
        r_squared,
        "market regressed on components"
    );

    Ok(ComponentRegression {
        components: selected.iter().map(|c| c.name.clone()).collect(),
        coefficients: beta.iter().skip(1).copied().collect(),
        intercept: beta[0],
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pca::{DecompositionConfig, decompose};
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ronda_traits::{Date, ReturnMatrix};

    fn dates(n: usize) -> Vec<Date> {
        (0..n)
            .map(|i| Date::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Duration::days(i as i64))
            .collect()
    }

    fn sample() -> (FactorSet, Vec<Date>) {
        let values = array![
            [0.010, 0.004],
            [-0.020, 0.006],
            [0.015, -0.010],
            [0.003, 0.002],
            [-0.008, 0.012],
            [0.012, -0.004]
        ];
        let d = dates(values.nrows());
        let matrix =
            ReturnMatrix::new(d.clone(), vec!["A".into(), "B".into()], values).unwrap();
        (decompose(&matrix, &DecompositionConfig::default()).unwrap(), d)
    }

    #[test]
    fn test_exact_linear_market() {
        let (factors, d) = sample();
        let pc1 = &factors.components()[0].scores;
        let pc2 = &factors.components()[1].scores;
        let market: Vec<f64> = (0..d.len())
            .map(|i| 0.001 + 0.5 * pc1[i] - 0.25 * pc2[i])
            .collect();
        let market = TimeSeries::new("market", d, market).unwrap();

        let fit = regress_on_components(&factors, &market, None).unwrap();
        assert_eq!(fit.components, vec!["PC1", "PC2"]);
        assert_abs_diff_eq!(fit.intercept, 0.001, epsilon = 1e-10);
        assert_abs_diff_eq!(fit.coefficients[0], 0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.coefficients[1], -0.25, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_subset_and_missing_component() {
        let (factors, d) = sample();
        let market = TimeSeries::new("market", d, vec![0.01, 0.0, -0.01, 0.02, 0.0, 0.01]).unwrap();

        let fit = regress_on_components(&factors, &market, Some(&["PC1"])).unwrap();
        assert_eq!(fit.coefficients.len(), 1);
        assert!((0.0..=1.0).contains(&fit.r_squared));

        let result = regress_on_components(&factors, &market, Some(&["PC7"]));
        assert!(matches!(result, Err(RondaError::MissingColumn(_))));
    }

    #[test]
    fn test_index_mismatch() {
        let (factors, _) = sample();
        let shifted: Vec<Date> = dates(7).into_iter().skip(1).collect();
        let market = TimeSeries::new("market", shifted, vec![0.0; 6]).unwrap();
        let result = regress_on_components(&factors, &market, None);
        assert!(matches!(result, Err(RondaError::DataContract(_))));
    }
}
