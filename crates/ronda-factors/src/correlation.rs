//! Pearson correlation between aligned dated series.
//!
//! Used to relate the benchmark to external indicators once they have been
//! aligned to a common date index upstream.

use std::collections::HashSet;

use ndarray::Array2;
use polars::prelude::*;
use ronda_traits::stats::MIN_STD_THRESHOLD;
use ronda_traits::{Result, RondaError, TimeSeries};

use crate::linalg::covariance_matrix;

/// Symmetric correlation table keyed by series name.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl CorrelationMatrix {
    /// Series names in row and column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Correlations, unit diagonal.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Correlation between two named series.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.values[[i, j]])
    }

    /// Table with a `series` column followed by one column per series.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.names.len() + 1);
        columns.push(Column::new("series".into(), self.names.clone()));
        for (j, name) in self.names.iter().enumerate() {
            columns.push(Column::new(name.as_str().into(), self.values.column(j).to_vec()));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Pairwise Pearson correlation of series sharing one date index.
///
/// # Errors
///
/// - no series or fewer than two dates: [`RondaError::InsufficientData`]
/// - differing date indices or duplicate names: [`RondaError::DataContract`]
/// - a series without dispersion: [`RondaError::Degenerate`]
pub fn correlation_matrix(series: &[&TimeSeries]) -> Result<CorrelationMatrix> {
    let Some(first) = series.first() else {
        return Err(RondaError::InsufficientData(
            "correlation needs at least one series".to_string(),
        ));
    };
    let mut seen = HashSet::new();
    for s in series {
        s.ensure_aligned(first, "correlation")?;
        if !seen.insert(s.name()) {
            return Err(RondaError::DataContract(format!(
                "correlation: series name '{}' appears twice",
                s.name()
            )));
        }
    }

    let data = Array2::from_shape_fn((first.len(), series.len()), |(t, j)| {
        series[j].values()[t]
    });
    let cov = covariance_matrix(&data)?;
    let std: Vec<f64> = cov.diag().iter().map(|v| v.max(0.0).sqrt()).collect();
    if let Some(j) = std.iter().position(|s| *s <= MIN_STD_THRESHOLD) {
        return Err(RondaError::Degenerate(format!(
            "correlation: series '{}' has no dispersion",
            series[j].name()
        )));
    }

    let n = series.len();
    let values = Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            1.0
        } else {
            (cov[[i, j]] / (std[i] * std[j])).clamp(-1.0, 1.0)
        }
    });
    tracing::debug!(series = n, dates = first.len(), "correlation matrix computed");

    Ok(CorrelationMatrix {
        names: series.iter().map(|s| s.name().to_string()).collect(),
        values,
    })
}
