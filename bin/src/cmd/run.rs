//! Full research run command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use ronda::{ResearchReport, run_pipeline};

use crate::OutputFormat;
use crate::cmd::{print_header, print_rule};
use crate::data::{load_config, load_returns, load_series, parse_date, write_csv};

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    /// Return matrix CSV: `date` plus one column per asset
    #[arg(short, long)]
    pub(crate) returns: PathBuf,

    /// Benchmark return CSV: `date` plus one value column
    #[arg(short, long)]
    pub(crate) benchmark: PathBuf,

    /// Benchmark column when the file holds several (defaults to
    /// `strategy.index_ticker`)
    #[arg(long)]
    pub(crate) benchmark_column: Option<String>,

    /// YAML run configuration (defaults when omitted)
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Overrides `outputs.results_dir` from the configuration
    #[arg(short, long)]
    pub(crate) output_dir: Option<PathBuf>,

    /// Start date (YYYY-MM-DD), overrides `data.start_date`
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), overrides `data.end_date`
    #[arg(long, value_parser = parse_date)]
    pub(crate) end: Option<NaiveDate>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub(crate) format: OutputFormat,
}

pub(crate) fn run_research(args: RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.outputs.results_dir));

    let start = args.start.or(config.data.start_date);
    let end = args.end.or(config.data.end_date);
    let benchmark_column = args
        .benchmark_column
        .as_deref()
        .or(config.strategy.index_ticker.as_deref());

    let returns = load_returns(&args.returns, start, end)?;
    let benchmark = load_series(&args.benchmark, benchmark_column, start, end)?;

    let report = run_pipeline(&returns, &benchmark, &config).context("research run failed")?;
    let written = write_outputs(&report, &output_dir)?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report.summary())
                .context("failed to serialize summary")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_report(&args, &report, &written),
    }
    Ok(())
}

/// Writes every result table and the JSON summary under `dir`.
fn write_outputs(report: &ResearchReport, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = vec![
        write_csv(
            &mut report.backtest.to_dataframe()?,
            dir,
            "strategy_cumulative_returns.csv",
        )?,
        write_csv(&mut report.risk.to_dataframe()?, dir, "top_pca_contributors.csv")?,
        write_csv(&mut report.factors.loadings_frame()?, dir, "pca_loadings.csv")?,
        write_csv(
            &mut report.risk.cumulative_variance_frame()?,
            dir,
            "pca_cumulative_variance.csv",
        )?,
        write_csv(&mut report.weights.to_dataframe()?, dir, "basket_weights.csv")?,
        write_csv(&mut report.signals.to_dataframe()?, dir, "spread_signals.csv")?,
    ];

    let summary_path = dir.join("summary.json");
    let json = serde_json::to_string_pretty(&report.summary())?;
    std::fs::write(&summary_path, json)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    written.push(summary_path);

    tracing::info!(dir = %dir.display(), files = written.len(), "results written");
    Ok(written)
}

fn print_report(args: &RunArgs, report: &ResearchReport, written: &[PathBuf]) {
    let summary = report.summary();
    print_header("Research Run");

    println!("Returns:   {}", args.returns.display());
    println!("Benchmark: {}", args.benchmark.display());
    println!(
        "Universe:  {} assets over {} dates",
        summary.n_assets, summary.n_dates
    );
    println!();

    print_rule("FACTORS");
    for (component, cumulative) in &report.risk.cumulative_variance {
        println!("  {:6} cumulative variance {:>8.2}%", component, cumulative * 100.0);
    }
    println!();
    println!("Top contributors:");
    for contributors in &report.risk.top_contributors {
        println!("  {:6} {}", contributors.component, contributors.assets.join(", "));
    }
    if let Some(fit) = &report.benchmark_regression {
        println!("  Benchmark R² on components: {:.4}", fit.r_squared);
    }
    println!();

    print_rule("RISK");
    println!(
        "  Portfolio Volatility: {:>10.2}%",
        summary.portfolio_volatility * 100.0
    );
    println!(
        "  VaR ({:.0}%, {}d):        {:>10.2}%",
        summary.confidence_level * 100.0,
        summary.time_horizon,
        summary.value_at_risk * 100.0
    );
    println!();

    print_rule("BACKTEST RESULTS");
    println!("  Total Return:      {:>10.2}%", summary.total_return * 100.0);
    println!(
        "  Annualized Return: {:>10.2}%",
        report.backtest.annualized_return * 100.0
    );
    println!(
        "  Annualized Vol:    {:>10.2}%",
        report.backtest.annualized_volatility * 100.0
    );
    println!("  Sharpe Ratio:      {:>10.2}", summary.sharpe_ratio);
    println!("  Max Drawdown:      {:>10.2}%", summary.max_drawdown * 100.0);
    println!("  Number of Trades:  {:>10}", summary.n_trades);
    println!(
        "  Transaction Costs: {:>10.4}%",
        report.backtest.total_transaction_costs * 100.0
    );
    println!();

    println!("Written:");
    for path in written {
        println!("  {}", path.display());
    }
    println!();
}
