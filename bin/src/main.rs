//! Ronda CLI binary.
//!
//! Runs the factor research pipeline, or one of its stages, on CSV tables.

mod cmd;
mod data;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ronda")]
#[command(about = "Factor decomposition and spread mean-reversion research", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: decomposition, risk, basket, signals, backtest
    Run(cmd::run::RunArgs),

    /// Decompose a return matrix into principal components
    Decompose(cmd::decompose::DecomposeArgs),

    /// Portfolio volatility and Value-at-Risk
    Risk(cmd::risk::RiskArgs),

    /// Pearson correlation between aligned series
    Correlate(cmd::correlate::CorrelateArgs),

    /// Backtest a single-instrument price strategy
    Strategy(cmd::strategy::StrategyArgs),

    /// Print the default run configuration as YAML
    Config,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match cli.command {
        Commands::Run(args) => cmd::run::run_research(args)?,
        Commands::Decompose(args) => cmd::decompose::run_decompose(args)?,
        Commands::Risk(args) => cmd::risk::run_risk(args)?,
        Commands::Correlate(args) => cmd::correlate::run_correlate(args)?,
        Commands::Strategy(args) => cmd::strategy::run_strategy(args)?,
        Commands::Config => print_default_config()?,
    }

    Ok(())
}

/// Logs go to stderr so JSON results on stdout stay parseable.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_default_config() -> Result<()> {
    let yaml = serde_yaml::to_string(&ronda::ResearchConfig::default())?;
    print!("{}", yaml);
    Ok(())
}
