//! Principal-component decomposition command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use ronda::factors::{DecompositionConfig, analyze_risk_factors, decompose};

use crate::cmd::{print_header, print_rule};
use crate::data::{load_returns, parse_date, write_csv};

#[derive(Debug, Args)]
pub(crate) struct DecomposeArgs {
    /// Return matrix CSV: `date` plus one column per asset
    #[arg(short, long)]
    pub(crate) returns: PathBuf,

    /// Keep exactly this many components
    #[arg(short = 'k', long, conflicts_with = "variance_threshold")]
    pub(crate) components: Option<usize>,

    /// Keep the fewest components reaching this explained-variance share
    #[arg(short, long)]
    pub(crate) variance_threshold: Option<f64>,

    /// Contributors listed per component
    #[arg(short = 'n', long, default_value = "5")]
    pub(crate) top_n: usize,

    /// Write loadings, scores and contributors here
    #[arg(short, long)]
    pub(crate) output_dir: Option<PathBuf>,

    /// Start date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) end: Option<NaiveDate>,
}

pub(crate) fn run_decompose(args: DecomposeArgs) -> Result<()> {
    let config = DecompositionConfig {
        n_components: args.components,
        variance_threshold: args.variance_threshold,
    };
    config.validate()?;

    let returns = load_returns(&args.returns, args.start, args.end)?;
    let factors = decompose(&returns, &config)?;
    let report = analyze_risk_factors(&factors, args.top_n)?;

    print_header("Factor Decomposition");
    println!(
        "{} assets, {} dates, {} components kept",
        returns.n_assets(),
        returns.n_dates(),
        factors.len()
    );
    println!();

    print_rule("EXPLAINED VARIANCE");
    println!("  {:6} {:>12} {:>12}", "", "ratio", "cumulative");
    let cumulative = factors.cumulative_explained_variance();
    for (component, total) in factors.components().iter().zip(&cumulative) {
        println!(
            "  {:6} {:>11.2}% {:>11.2}%",
            component.name,
            component.explained_variance_ratio * 100.0,
            total * 100.0
        );
    }
    println!();

    print_rule("TOP CONTRIBUTORS");
    for contributors in &report.top_contributors {
        println!("  {:6} {}", contributors.component, contributors.assets.join(", "));
    }
    println!();

    if let Some(dir) = &args.output_dir {
        let paths = [
            write_csv(&mut factors.loadings_frame()?, dir, "pca_loadings.csv")?,
            write_csv(&mut factors.scores_frame()?, dir, "pca_scores.csv")?,
            write_csv(&mut report.to_dataframe()?, dir, "top_pca_contributors.csv")?,
        ];
        println!("Written:");
        for path in paths {
            println!("  {}", path.display());
        }
        println!();
    }
    Ok(())
}
