//! Correlation command over the columns of one aligned table.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Args;
use ronda::TimeSeries;
use ronda::factors::correlation_matrix;
use ronda::traits::DATE_COLUMN;

use crate::cmd::{print_header, print_rule};
use crate::data::{parse_date, read_csv, restrict_dates, write_csv};

#[derive(Debug, Args)]
pub(crate) struct CorrelateArgs {
    /// Aligned CSV: `date` plus one column per series (benchmark, indicators)
    #[arg(short, long)]
    pub(crate) table: PathBuf,

    /// Write `correlation.csv` here
    #[arg(short, long)]
    pub(crate) output_dir: Option<PathBuf>,

    /// Start date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) end: Option<NaiveDate>,
}

pub(crate) fn run_correlate(args: CorrelateArgs) -> Result<()> {
    let df = restrict_dates(read_csv(&args.table)?, args.start, args.end)?;
    let series = df
        .get_column_names()
        .into_iter()
        .filter(|c| c.as_str() != DATE_COLUMN)
        .map(|c| {
            TimeSeries::from_dataframe(&df, DATE_COLUMN, c.as_str())
                .with_context(|| format!("invalid series '{c}' in {}", args.table.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    if series.len() < 2 {
        bail!("{} needs at least two value columns", args.table.display());
    }

    let refs: Vec<&TimeSeries> = series.iter().collect();
    let corr = correlation_matrix(&refs)?;

    print_header("Correlation");
    print_rule("PEARSON");
    print!("  {:>12}", "");
    for name in corr.names() {
        print!(" {:>12}", name);
    }
    println!();
    for (i, name) in corr.names().iter().enumerate() {
        print!("  {:>12}", name);
        for j in 0..corr.names().len() {
            print!(" {:>12.4}", corr.values()[[i, j]]);
        }
        println!();
    }
    println!();

    if let Some(dir) = &args.output_dir {
        let path = write_csv(&mut corr.to_dataframe()?, dir, "correlation.csv")?;
        println!("Written:\n  {}\n", path.display());
    }
    Ok(())
}
