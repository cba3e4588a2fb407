//! Pricing a synthetic basket from raw asset returns.

use std::collections::HashSet;

use ndarray::Array1;
use ronda_traits::{Result, ReturnMatrix, RondaError, TimeSeries};

use crate::weights::BasketWeights;

/// Name given to the priced basket series.
pub const BASKET_SERIES: &str = "basket";

/// Per-date weighted sum of asset returns.
///
/// The matrix columns and the weight keys must be the same set; column
/// order does not matter since weights are matched by asset identifier.
///
/// # Errors
///
/// Returns [`RondaError::DataContract`] naming the unmatched assets when
/// the two sets differ.
pub fn basket_returns(returns: &ReturnMatrix, weights: &BasketWeights) -> Result<TimeSeries> {
    let columns: HashSet<&str> = returns.assets().iter().map(String::as_str).collect();
    let keys: HashSet<&str> = weights.assets().iter().map(String::as_str).collect();

    if columns != keys {
        let mut missing: Vec<&str> = keys.difference(&columns).copied().collect();
        let mut unweighted: Vec<&str> = columns.difference(&keys).copied().collect();
        missing.sort_unstable();
        unweighted.sort_unstable();
        return Err(RondaError::DataContract(format!(
            "basket pricing: weights for assets not in the return matrix {missing:?}, \
             return columns without a weight {unweighted:?}"
        )));
    }

    let mut aligned = Array1::<f64>::zeros(returns.n_assets());
    for (asset, weight) in weights.iter() {
        if let Some(j) = returns.asset_index(asset) {
            aligned[j] = weight;
        }
    }
    let values = returns.values().dot(&aligned);

    tracing::debug!(dates = values.len(), assets = weights.len(), "basket priced");
    TimeSeries::new(BASKET_SERIES, returns.dates().to_vec(), values.to_vec())
}
