//! Basket weights derived from a factor's loadings.

use std::collections::HashSet;

use polars::prelude::*;
use ronda_factors::FactorSet;
use ronda_traits::{Result, RondaError, Symbol};
use serde::{Deserialize, Serialize};

/// Label of the component a basket replicates by default.
pub const DOMINANT_COMPONENT: &str = "PC1";

/// Signed weight per asset, normalised to a gross exposure of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketWeights {
    assets: Vec<Symbol>,
    weights: Vec<f64>,
}

impl BasketWeights {
    /// Normalises raw loadings by the sum of their absolute values.
    ///
    /// # Errors
    ///
    /// Fails when the two slices differ in length, an asset repeats, a
    /// loading is non-finite, or every loading is zero.
    pub fn from_loadings(assets: &[Symbol], loadings: &[f64]) -> Result<Self> {
        if assets.len() != loadings.len() {
            return Err(RondaError::DataContract(format!(
                "basket weights: {} assets but {} loadings",
                assets.len(),
                loadings.len()
            )));
        }
        let mut seen = HashSet::with_capacity(assets.len());
        if let Some(dup) = assets.iter().find(|a| !seen.insert(a.as_str())) {
            return Err(RondaError::DataContract(format!(
                "basket weights: asset '{dup}' appears twice"
            )));
        }
        if loadings.iter().any(|l| !l.is_finite()) {
            return Err(RondaError::DataContract(
                "basket weights: loadings must be finite".to_string(),
            ));
        }

        let gross: f64 = loadings.iter().map(|l| l.abs()).sum();
        if gross == 0.0 {
            return Err(RondaError::Degenerate(
                "basket weights: loading vector is entirely zero".to_string(),
            ));
        }

        Ok(Self {
            assets: assets.to_vec(),
            weights: loadings.iter().map(|l| l / gross).collect(),
        })
    }

    /// Weights replicating the named component of `factors`.
    pub fn from_component(factors: &FactorSet, component: &str) -> Result<Self> {
        let c = factors
            .component(component)
            .ok_or_else(|| RondaError::MissingColumn(component.to_string()))?;
        let weights = Self::from_loadings(factors.assets(), &c.loadings.to_vec())?;
        tracing::debug!(component, gross = weights.gross_exposure(), "basket weights derived");
        Ok(weights)
    }

    /// Weights replicating the first (largest-variance) component.
    pub fn dominant(factors: &FactorSet) -> Result<Self> {
        Self::from_component(factors, DOMINANT_COMPONENT)
    }

    /// Assets in weight order.
    pub fn assets(&self) -> &[Symbol] {
        &self.assets
    }

    /// Weights in asset order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weight of one asset.
    pub fn get(&self, asset: &str) -> Option<f64> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|i| self.weights[i])
    }

    /// Iterates `(asset, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.assets
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }

    /// Number of assets in the basket.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the basket holds no asset.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Sum of absolute weights.
    pub fn gross_exposure(&self) -> f64 {
        self.weights.iter().map(|w| w.abs()).sum()
    }

    /// Two-column table with `asset` and `weight`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            Column::new("asset".into(), self.assets.clone()),
            Column::new("weight".into(), self.weights.clone()),
        ])?)
    }
}
