//! Single-instrument price strategy command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use ronda::SignalRule;
use ronda::eval::backtest_price_signals;
use ronda::signals::{StrategyKind, TrendCrossovers, identify_trends};
use serde::Serialize;

use crate::OutputFormat;
use crate::cmd::{print_header, print_rule};
use crate::data::{load_series, parse_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum KindArg {
    GoldenCross,
    MeanReversion,
    Momentum,
}

#[derive(Debug, Args)]
pub(crate) struct StrategyArgs {
    /// Close-price CSV: `date` plus one or more price columns
    #[arg(short, long)]
    pub(crate) prices: PathBuf,

    /// Price column when the file holds several
    #[arg(long)]
    pub(crate) column: Option<String>,

    /// Strategy kind
    #[arg(short, long, value_enum, default_value = "golden-cross")]
    pub(crate) kind: KindArg,

    /// Fast moving-average period (golden cross)
    #[arg(long)]
    pub(crate) fast: Option<usize>,

    /// Slow moving-average period (golden cross)
    #[arg(long)]
    pub(crate) slow: Option<usize>,

    /// Rolling window (mean reversion)
    #[arg(long)]
    pub(crate) window: Option<usize>,

    /// Band width in standard deviations (mean reversion)
    #[arg(long)]
    pub(crate) band: Option<f64>,

    /// Return lookback (momentum)
    #[arg(long)]
    pub(crate) period: Option<usize>,

    /// Trigger return (momentum)
    #[arg(long)]
    pub(crate) threshold: Option<f64>,

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

impl StrategyArgs {
    /// Strategy with the kind's defaults, overridden by any given flag.
    pub(crate) fn strategy(&self) -> StrategyKind {
        let mut strategy = match self.kind {
            KindArg::GoldenCross => StrategyKind::golden_cross(),
            KindArg::MeanReversion => StrategyKind::mean_reversion(),
            KindArg::Momentum => StrategyKind::momentum(),
        };
        match &mut strategy {
            StrategyKind::GoldenCross { fast, slow } => {
                *fast = self.fast.unwrap_or(*fast);
                *slow = self.slow.unwrap_or(*slow);
            }
            StrategyKind::MeanReversion { window, band } => {
                *window = self.window.unwrap_or(*window);
                *band = self.band.unwrap_or(*band);
            }
            StrategyKind::Momentum { period, threshold } => {
                *period = self.period.unwrap_or(*period);
                *threshold = self.threshold.unwrap_or(*threshold);
            }
        }
        strategy
    }
}

#[derive(Debug, Serialize)]
struct StrategyReport {
    series: String,
    strategy: StrategyKind,
    n_closes: usize,
    n_buy_signals: usize,
    n_sell_signals: usize,
    final_cumulative_return: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    trends: Option<TrendCrossovers>,
}

pub(crate) fn run_strategy(args: StrategyArgs) -> Result<()> {
    let strategy = args.strategy();
    strategy.validate()?;

    let closes = load_series(&args.prices, args.column.as_deref(), args.start, args.end)?;
    let signals = strategy.generate(&closes)?;
    let final_cumulative_return = backtest_price_signals(&closes, &signals)?;
    let trends = match strategy {
        StrategyKind::GoldenCross { fast, slow } => Some(identify_trends(&closes, fast, slow)?),
        _ => None,
    };
    tracing::info!(
        strategy = strategy.name(),
        final_cumulative_return,
        "price strategy backtested"
    );

    let report = StrategyReport {
        series: closes.name().to_string(),
        strategy,
        n_closes: closes.len(),
        n_buy_signals: signals.iter().filter(|s| **s > 0).count(),
        n_sell_signals: signals.iter().filter(|s| **s < 0).count(),
        final_cumulative_return,
        trends,
    };

    if args.format == OutputFormat::Json {
        let json =
            serde_json::to_string_pretty(&report).context("failed to serialize strategy")?;
        println!("{}", json);
        return Ok(());
    }

    print_header("Price Strategy");
    println!("Series:   {} ({} closes)", report.series, report.n_closes);
    println!("Strategy: {:?}", report.strategy);
    println!();

    print_rule("SIGNALS");
    println!("  Buy signals:       {:>10}", report.n_buy_signals);
    println!("  Sell signals:      {:>10}", report.n_sell_signals);
    println!(
        "  Final Return:      {:>10.2}%",
        report.final_cumulative_return * 100.0
    );
    println!();

    if let Some(trends) = &report.trends {
        print_rule("CROSSOVERS");
        for date in &trends.bullish {
            println!("  {}  bullish", date);
        }
        for date in &trends.bearish {
            println!("  {}  bearish", date);
        }
        if trends.bullish.is_empty() && trends.bearish.is_empty() {
            println!("  none");
        }
        println!();
    }
    Ok(())
}
