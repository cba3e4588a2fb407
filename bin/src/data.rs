//! Loading tables and configuration for the Ronda CLI.
//!
//! Input tables are CSV files with a `date` column in `YYYY-MM-DD` form and
//! one numeric column per series. Cleaning is the caller's job: a missing
//! or non-numeric cell is reported, not filled.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use polars::prelude::*;
use ronda::traits::DATE_COLUMN;
use ronda::{ResearchConfig, ReturnMatrix, RondaError, TimeSeries};

/// Parse a date string in YYYY-MM-DD format.
pub(crate) fn parse_date(date_str: &str) -> Result<NaiveDate, RondaError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|e| RondaError::InvalidDate(format!("'{date_str}': {e}")))
}

/// Reads a CSV file with a header row.
pub(crate) fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("failed to read CSV file {}", path.display()))
}

/// Keeps the rows whose date lies within `[start, end]`.
pub(crate) fn restrict_dates(
    df: DataFrame,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<DataFrame> {
    if start.is_none() && end.is_none() {
        return Ok(df);
    }
    let date = || col(DATE_COLUMN).cast(DataType::String);
    let mut lazy = df.lazy();
    if let Some(start) = start {
        lazy = lazy.filter(date().gt_eq(lit(start.format("%Y-%m-%d").to_string())));
    }
    if let Some(end) = end {
        lazy = lazy.filter(date().lt_eq(lit(end.format("%Y-%m-%d").to_string())));
    }
    let filtered = lazy.collect().context("failed to filter rows by date")?;
    if filtered.height() == 0 {
        bail!("no rows left between {start:?} and {end:?}");
    }
    Ok(filtered)
}

/// Loads a return matrix: `date` plus one column per asset.
pub(crate) fn load_returns(
    path: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<ReturnMatrix> {
    let df = restrict_dates(read_csv(path)?, start, end)?;
    let returns = ReturnMatrix::from_dataframe(&df, DATE_COLUMN)
        .with_context(|| format!("invalid return matrix in {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        dates = returns.n_dates(),
        assets = returns.n_assets(),
        "return matrix loaded"
    );
    Ok(returns)
}

/// Loads one dated series.
///
/// Without an explicit `column` the file must hold exactly one column
/// besides `date`.
pub(crate) fn load_series(
    path: &Path,
    column: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<TimeSeries> {
    let df = restrict_dates(read_csv(path)?, start, end)?;
    let name = match column {
        Some(name) => name.to_string(),
        None => {
            let values: Vec<String> = df
                .get_column_names()
                .into_iter()
                .filter(|c| c.as_str() != DATE_COLUMN)
                .map(|c| c.to_string())
                .collect();
            match values.as_slice() {
                [only] => only.clone(),
                _ => bail!(
                    "{} has {} value columns; pick one with --column",
                    path.display(),
                    values.len()
                ),
            }
        }
    };
    let series = TimeSeries::from_dataframe(&df, DATE_COLUMN, &name)
        .with_context(|| format!("invalid series '{name}' in {}", path.display()))?;
    tracing::info!(path = %path.display(), series = %name, rows = series.len(), "series loaded");
    Ok(series)
}

/// Loads the run configuration, or the defaults when no file is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<ResearchConfig> {
    let Some(path) = path else {
        return Ok(ResearchConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = parse_config(&text)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    tracing::info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Parses and validates a YAML configuration.
pub(crate) fn parse_config(text: &str) -> Result<ResearchConfig> {
    let config: ResearchConfig = serde_yaml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Writes `df` as `<dir>/<name>`, creating `dir` when needed.
pub(crate) fn write_csv(df: &mut DataFrame, dir: &Path, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let path = dir.join(name);
    let mut file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), rows = df.height(), "table written");
    Ok(path)
}
