//! Portfolio volatility and Value-at-Risk command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use ronda::factors::{RiskConfig, portfolio_volatility, value_at_risk};
use serde::Serialize;

use crate::OutputFormat;
use crate::cmd::{print_header, print_rule};
use crate::data::{load_returns, parse_date};

#[derive(Debug, Args)]
pub(crate) struct RiskArgs {
    /// Return matrix CSV: `date` plus one column per asset
    #[arg(short, long)]
    pub(crate) returns: PathBuf,

    /// VaR confidence level in (0, 1)
    #[arg(short, long, default_value = "0.95")]
    pub(crate) confidence: f64,

    /// VaR horizon in days
    #[arg(short = 'H', long, default_value = "1")]
    pub(crate) horizon: usize,

    /// Portfolio weights in column order (equal weight when omitted)
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    pub(crate) weights: Option<Vec<f64>>,

    /// Start date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) end: Option<NaiveDate>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub(crate) format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct RiskSummary {
    n_assets: usize,
    n_dates: usize,
    portfolio_volatility: f64,
    confidence_level: f64,
    time_horizon: usize,
    value_at_risk: f64,
}

pub(crate) fn run_risk(args: RiskArgs) -> Result<()> {
    let config = RiskConfig {
        confidence_level: args.confidence,
        time_horizon: args.horizon,
        ..Default::default()
    };
    config.validate()?;

    let returns = load_returns(&args.returns, args.start, args.end)?;
    let summary = RiskSummary {
        n_assets: returns.n_assets(),
        n_dates: returns.n_dates(),
        portfolio_volatility: portfolio_volatility(&returns, args.weights.as_deref())?,
        confidence_level: config.confidence_level,
        time_horizon: config.time_horizon,
        value_at_risk: value_at_risk(&returns, config.confidence_level, config.time_horizon)?,
    };

    if args.format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&summary).context("failed to serialize risk")?;
        println!("{}", json);
        return Ok(());
    }

    print_header("Risk Analysis");
    println!("{} assets over {} dates", summary.n_assets, summary.n_dates);
    if args.weights.is_some() {
        println!("Weights:  as given");
    } else {
        println!("Weights:  equal");
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
    Ok(())
}
