//! Common types used throughout the Ronda pipeline.
//!
//! The pipeline works on two shapes of data: a dates × assets
//! [`ReturnMatrix`] and single dated [`TimeSeries`] (basket, benchmark and
//! spread returns). Both validate their invariants on construction so the
//! numeric stages never see missing values, duplicate assets or unordered
//! dates.

use std::collections::HashSet;

use ndarray::{Array2, ArrayView1, Axis};
use polars::prelude::*;
use serde::Serialize;

use crate::{Result, RondaError};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// An asset identifier, typically a ticker symbol like "AAPL".
pub type Symbol = String;

/// Name of the date column used when converting to and from DataFrames.
pub const DATE_COLUMN: &str = "date";

/// A dates × assets table of fractional daily returns.
///
/// # Invariants
///
/// - at least one date and one asset
/// - asset identifiers are unique
/// - dates are strictly increasing
/// - every cell is finite
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnMatrix {
    dates: Vec<Date>,
    assets: Vec<Symbol>,
    values: Array2<f64>,
}

impl ReturnMatrix {
    /// Creates a return matrix after checking every invariant.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InsufficientData`] for an empty table and
    /// [`RondaError::DataContract`] for shape mismatches, duplicate assets,
    /// unordered dates or non-finite cells.
    pub fn new(dates: Vec<Date>, assets: Vec<Symbol>, values: Array2<f64>) -> Result<Self> {
        if dates.is_empty() || assets.is_empty() {
            return Err(RondaError::InsufficientData(format!(
                "return matrix has {} dates and {} assets",
                dates.len(),
                assets.len()
            )));
        }
        if values.dim() != (dates.len(), assets.len()) {
            return Err(RondaError::DataContract(format!(
                "return matrix shape {:?} does not match {} dates x {} assets",
                values.dim(),
                dates.len(),
                assets.len()
            )));
        }

        let mut seen = HashSet::with_capacity(assets.len());
        if let Some(dup) = assets.iter().find(|a| !seen.insert(a.as_str())) {
            return Err(RondaError::DataContract(format!(
                "return matrix has duplicate asset column '{dup}'"
            )));
        }

        ensure_chronological(&dates, "return matrix")?;

        if let Some(((row, col), _)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(RondaError::DataContract(format!(
                "return matrix has a missing or infinite value for '{}' on {}",
                assets[col], dates[row]
            )));
        }

        Ok(Self {
            dates,
            assets,
            values,
        })
    }

    /// Builds a return matrix from a DataFrame holding a date column and one
    /// numeric column per asset.
    ///
    /// Columns appear in the matrix in DataFrame order. Missing values are
    /// rejected rather than filled; cleaning belongs upstream.
    pub fn from_dataframe(df: &DataFrame, date_column: &str) -> Result<Self> {
        let dates = parse_dates(df, date_column)?;

        let assets: Vec<Symbol> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|name| name != date_column)
            .collect();

        let mut values = Array2::zeros((dates.len(), assets.len()));
        for (j, asset) in assets.iter().enumerate() {
            let column = read_f64_column(df, asset)?;
            for (i, v) in column.into_iter().enumerate() {
                values[[i, j]] = v;
            }
        }

        Self::new(dates, assets, values)
    }

    /// Converts the matrix back into a DataFrame with a leading `date` column.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.assets.len() + 1);
        columns.push(date_column(&self.dates));
        for (j, asset) in self.assets.iter().enumerate() {
            let values: Vec<f64> = self.values.column(j).to_vec();
            columns.push(Column::new(asset.as_str().into(), values));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Returns the chronological date index.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Returns the asset identifiers in column order.
    pub fn assets(&self) -> &[Symbol] {
        &self.assets
    }

    /// Returns the underlying dates × assets array.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of dates (rows).
    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    /// Number of assets (columns).
    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    /// Position of an asset in column order.
    pub fn asset_index(&self, symbol: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == symbol)
    }

    /// Returns the return column of one asset.
    pub fn column(&self, symbol: &str) -> Option<ArrayView1<'_, f64>> {
        self.asset_index(symbol)
            .map(|j| self.values.index_axis(Axis(1), j))
    }
}

/// A single chronological series of returns keyed by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    name: String,
    dates: Vec<Date>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Creates a named series.
    ///
    /// # Errors
    ///
    /// Fails when lengths differ, dates are not strictly increasing or a
    /// value is not finite.
    pub fn new(name: impl Into<String>, dates: Vec<Date>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if dates.len() != values.len() {
            return Err(RondaError::DataContract(format!(
                "series '{name}' has {} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        ensure_chronological(&dates, &name)?;
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(RondaError::DataContract(format!(
                "series '{name}' has a missing or infinite value on {}",
                dates[i]
            )));
        }
        Ok(Self {
            name,
            dates,
            values,
        })
    }

    /// Reads one numeric column of a DataFrame as a series.
    pub fn from_dataframe(df: &DataFrame, date_column: &str, value_column: &str) -> Result<Self> {
        let dates = parse_dates(df, date_column)?;
        let values = read_f64_column(df, value_column)?;
        Self::new(value_column, dates, values)
    }

    /// Converts the series into a two-column DataFrame (`date`, name).
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            date_column(&self.dates),
            Column::new(self.name.as_str().into(), self.values.clone()),
        ])?)
    }

    /// Returns the series name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the date index.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Returns the values in date order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns a copy of the series under a different name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Fails unless both series share exactly the same date index.
    ///
    /// No reindexing is attempted: a mismatch is a data contract violation.
    pub fn ensure_aligned(&self, other: &Self, stage: &str) -> Result<()> {
        ensure_same_index(&self.dates, other.dates(), stage, &self.name, &other.name)
    }
}

/// Fails unless two date indices are identical.
pub fn ensure_same_index(
    left: &[Date],
    right: &[Date],
    stage: &str,
    left_name: &str,
    right_name: &str,
) -> Result<()> {
    if left.len() != right.len() {
        return Err(RondaError::DataContract(format!(
            "{stage}: '{left_name}' has {} dates but '{right_name}' has {}",
            left.len(),
            right.len()
        )));
    }
    if let Some(i) = left.iter().zip(right).position(|(a, b)| a != b) {
        return Err(RondaError::DataContract(format!(
            "{stage}: indices of '{left_name}' and '{right_name}' differ at row {i} ({} vs {})",
            left[i], right[i]
        )));
    }
    Ok(())
}

fn ensure_chronological(dates: &[Date], what: &str) -> Result<()> {
    if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(RondaError::DataContract(format!(
            "{what}: dates must be strictly increasing ({} then {})",
            w[0], w[1]
        )));
    }
    Ok(())
}

fn date_column(dates: &[Date]) -> Column {
    let formatted: Vec<String> = dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    Column::new(DATE_COLUMN.into(), formatted)
}

/// Parses a date column stored either as `Date` or as `YYYY-MM-DD` strings.
fn parse_dates(df: &DataFrame, date_column: &str) -> Result<Vec<Date>> {
    let column = df
        .column(date_column)
        .map_err(|_| RondaError::MissingColumn(date_column.to_string()))?;
    let as_text = column.as_materialized_series().cast(&DataType::String)?;

    as_text
        .str()?
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            let text = d.ok_or_else(|| {
                RondaError::InvalidDate(format!("row {i} of '{date_column}' is empty"))
            })?;
            Date::parse_from_str(text, "%Y-%m-%d")
                .map_err(|e| RondaError::InvalidDate(format!("'{text}' at row {i}: {e}")))
        })
        .collect()
}

fn read_f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| RondaError::MissingColumn(name.to_string()))?;
    let as_float = column.as_materialized_series().cast(&DataType::Float64)?;

    as_float
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                RondaError::DataContract(format!("column '{name}' has a missing value at row {i}"))
            })
        })
        .collect()
}
