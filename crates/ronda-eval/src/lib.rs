//! Backtesting and performance evaluation for Ronda.
//!
//! This crate provides:
//! - A spread backtest with one-period execution lag and transaction costs
//! - Sharpe ratio, drawdown and annualization helpers
//! - A single-instrument backtest for price strategy signals
//!
//! # Example
//!
//! ```rust,ignore
//! use ronda_eval::{BacktestConfig, SpreadBacktest};
//!
//! let result = SpreadBacktest::new(BacktestConfig::default()).run(&spread, &signals)?;
//! println!("Sharpe {:.2}, max drawdown {:.2%}", result.sharpe_ratio, result.max_drawdown);
//! ```

pub mod backtest;
pub mod metrics;

// Re-export main types
pub use backtest::{
    BacktestConfig, BacktestResult, ExposureMode, SpreadBacktest, backtest_price_signals,
};
pub use metrics::{
    annualized_return, annualized_volatility, drawdown_series, max_drawdown, sharpe_ratio,
};
