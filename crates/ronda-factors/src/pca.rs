//! Principal-component decomposition of a return matrix.
//!
//! The covariance of the (column-centred) returns is diagonalised and each
//! eigenvector becomes one factor: its entries are the asset loadings and
//! projecting the centred returns onto it gives the factor's score series.
//! Explained-variance ratios are taken against the total variance of all
//! components, so truncating to `k` factors reports how much is left out.

use ndarray::{Array1, Array2, s};
use polars::prelude::*;
use ronda_traits::stats::MIN_STD_THRESHOLD;
use ronda_traits::{DATE_COLUMN, Date, Result, ReturnMatrix, RondaError, Symbol};
use serde::{Deserialize, Serialize};

use crate::linalg::{column_means, covariance_matrix, symmetric_eigen};

/// Slack applied when comparing cumulative ratios to a threshold, so that
/// ratios like `[0.6, 0.3, 0.1]` meet a threshold of `0.9` despite rounding.
const THRESHOLD_EPSILON: f64 = 1e-12;

/// How many components to keep.
///
/// Set at most one of the two fields; leaving both unset keeps every
/// component (`min(dates, assets)`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecompositionConfig {
    /// Explicit number of components.
    pub n_components: Option<usize>,
    /// Smallest cumulative explained-variance ratio to reach, in (0, 1).
    pub variance_threshold: Option<f64>,
}

/// Validated component selection rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentSelection {
    /// Keep every component.
    All,
    /// Keep exactly this many components.
    Count(usize),
    /// Keep the fewest components whose cumulative ratio meets the threshold.
    VarianceThreshold(f64),
}

impl DecompositionConfig {
    /// Keep a fixed number of components.
    pub const fn with_components(n_components: usize) -> Self {
        Self {
            n_components: Some(n_components),
            variance_threshold: None,
        }
    }

    /// Keep enough components to explain `threshold` of the variance.
    pub const fn with_variance_threshold(threshold: f64) -> Self {
        Self {
            n_components: None,
            variance_threshold: Some(threshold),
        }
    }

    /// Checks the configuration and returns the selection rule.
    ///
    /// # Errors
    ///
    /// Both fields set, a zero component count, or a threshold outside
    /// (0, 1) are configuration errors.
    pub fn selection(&self) -> Result<ComponentSelection> {
        match (self.n_components, self.variance_threshold) {
            (Some(_), Some(_)) => Err(RondaError::InvalidConfig(
                "provide either n_components or variance_threshold, not both".to_string(),
            )),
            (Some(0), None) => Err(RondaError::InvalidConfig(
                "n_components must be at least 1".to_string(),
            )),
            (Some(k), None) => Ok(ComponentSelection::Count(k)),
            (None, Some(t)) if !(t > 0.0 && t < 1.0) => Err(RondaError::InvalidConfig(format!(
                "variance_threshold must lie in (0, 1), got {t}"
            ))),
            (None, Some(t)) => Ok(ComponentSelection::VarianceThreshold(t)),
            (None, None) => Ok(ComponentSelection::All),
        }
    }

    /// Validates the configuration without returning the selection.
    pub fn validate(&self) -> Result<()> {
        self.selection().map(|_| ())
    }
}

/// One principal component.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Component label, `PC1`, `PC2`, ...
    pub name: String,
    /// Variance of the score series (eigenvalue of the covariance matrix).
    pub explained_variance: f64,
    /// Share of total variance captured by this component.
    pub explained_variance_ratio: f64,
    /// Unit-norm loading vector over the asset columns.
    pub loadings: Array1<f64>,
    /// Projection of the centred returns on the loadings, one value per date.
    pub scores: Array1<f64>,
}

/// Ordered set of principal components of one return matrix.
#[derive(Debug, Clone)]
pub struct FactorSet {
    assets: Vec<Symbol>,
    dates: Vec<Date>,
    means: Array1<f64>,
    components: Vec<Component>,
}

impl FactorSet {
    /// Components in decreasing order of explained variance.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Looks up a component by label.
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Number of retained components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no component was retained.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Asset identifiers in loading order.
    pub fn assets(&self) -> &[Symbol] {
        &self.assets
    }

    /// Date index of the score series.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Column means removed before projection.
    pub const fn means(&self) -> &Array1<f64> {
        &self.means
    }

    /// Explained-variance ratio of each component.
    pub fn explained_variance_ratios(&self) -> Vec<f64> {
        self.components
            .iter()
            .map(|c| c.explained_variance_ratio)
            .collect()
    }

    /// Running sum of the explained-variance ratios.
    pub fn cumulative_explained_variance(&self) -> Vec<f64> {
        self.components
            .iter()
            .scan(0.0, |acc, c| {
                *acc += c.explained_variance_ratio;
                Some(*acc)
            })
            .collect()
    }

    /// Loadings as an assets × components matrix.
    pub fn loadings_matrix(&self) -> Array2<f64> {
        let mut m = Array2::zeros((self.assets.len(), self.components.len()));
        for (j, c) in self.components.iter().enumerate() {
            m.column_mut(j).assign(&c.loadings);
        }
        m
    }

    /// Loadings table: an `asset` column followed by one column per component.
    pub fn loadings_frame(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.components.len() + 1);
        columns.push(Column::new("asset".into(), self.assets.clone()));
        for c in &self.components {
            columns.push(Column::new(c.name.as_str().into(), c.loadings.to_vec()));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Score table: a `date` column followed by one column per component.
    pub fn scores_frame(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.components.len() + 1);
        let dates: Vec<String> = self.dates.iter().map(|d| d.to_string()).collect();
        columns.push(Column::new(DATE_COLUMN.into(), dates));
        for c in &self.components {
            columns.push(Column::new(c.name.as_str().into(), c.scores.to_vec()));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Smallest component count whose cumulative ratio meets `threshold`.
///
/// # Errors
///
/// Fails for a threshold outside (0, 1) or an empty ratio list.
pub fn select_component_count(ratios: &[f64], threshold: f64) -> Result<usize> {
    if !(threshold > 0.0 && threshold < 1.0) {
        return Err(RondaError::InvalidConfig(format!(
            "variance_threshold must lie in (0, 1), got {threshold}"
        )));
    }
    if ratios.is_empty() {
        return Err(RondaError::Degenerate(
            "no components to select from".to_string(),
        ));
    }

    let mut cumulative = 0.0;
    for (i, r) in ratios.iter().enumerate() {
        cumulative += r;
        if cumulative + THRESHOLD_EPSILON >= threshold {
            return Ok(i + 1);
        }
    }
    Ok(ratios.len())
}

/// Decomposes a return matrix into principal components.
///
/// # Errors
///
/// - invalid [`DecompositionConfig`] or a component count above
///   `min(dates, assets)`: [`RondaError::InvalidConfig`]
/// - fewer than two dates: [`RondaError::InsufficientData`]
/// - zero total variance: [`RondaError::Degenerate`]
pub fn decompose(returns: &ReturnMatrix, config: &DecompositionConfig) -> Result<FactorSet> {
    let selection = config.selection()?;
    let data = returns.values();
    let max_components = returns.n_dates().min(returns.n_assets());

    let covariance = covariance_matrix(data)?;
    let total_variance = covariance.diag().sum();
    if !total_variance.is_finite() || total_variance <= MIN_STD_THRESHOLD.powi(2) {
        return Err(RondaError::Degenerate(
            "return matrix has zero variance; decomposition yields no components".to_string(),
        ));
    }

    let eigen = symmetric_eigen(&covariance)?;
    let variances: Vec<f64> = eigen
        .values
        .iter()
        .take(max_components)
        .map(|v| v.max(0.0))
        .collect();
    let ratios: Vec<f64> = variances.iter().map(|v| v / total_variance).collect();

    let k = match selection {
        ComponentSelection::All => max_components,
        ComponentSelection::Count(k) if k > max_components => {
            return Err(RondaError::InvalidConfig(format!(
                "n_components={k} exceeds min(dates, assets)={max_components}"
            )));
        }
        ComponentSelection::Count(k) => k,
        ComponentSelection::VarianceThreshold(t) => select_component_count(&ratios, t)?,
    };

    let means = column_means(data);
    let centered = data - &means;
    let loadings = eigen.vectors.slice(s![.., ..k]).to_owned();
    let scores = centered.dot(&loadings);

    let components: Vec<Component> = (0..k)
        .map(|i| Component {
            name: format!("PC{}", i + 1),
            explained_variance: variances[i],
            explained_variance_ratio: ratios[i],
            loadings: loadings.column(i).to_owned(),
            scores: scores.column(i).to_owned(),
        })
        .collect();

    let explained: f64 = ratios[..k].iter().sum();
    tracing::info!(
        components = k,
        assets = returns.n_assets(),
        dates = returns.n_dates(),
        explained_pct = explained * 100.0,
        "factor decomposition complete"
    );

    Ok(FactorSet {
        assets: returns.assets().to_vec(),
        dates: returns.dates().to_vec(),
        means,
        components,
    })
}
