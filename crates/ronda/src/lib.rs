#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! ## Crate Organization
//!
//! - [`traits`] - Error type, data types and the [`SignalRule`] trait
//! - [`factors`] - Principal components, risk analytics, component regression
//! - [`combine`] - Factor-replicating basket construction
//! - [`signals`] - Spread z-score state machine and price strategies
//! - [`eval`] - Spread backtest and performance metrics
//!
//! ## Data Flow
//!
//! 1. **Decomposition** reduces the return matrix to orthogonal components
//! 2. **Risk** reports volatility, contributors and Value-at-Risk
//! 3. **Basket** turns the first component's loadings into weights
//! 4. **Signals** walk the basket-minus-benchmark z-score
//! 5. **Backtest** charges costs and compounds the lagged exposure

/// Version information for the ronda crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod pipeline;

pub use pipeline::{
    DataConfig, OutputConfig, ResearchConfig, ResearchReport, ResearchSummary, StrategyConfig,
    run_pipeline,
};

/// Core types shared across the workspace.
///
/// ```ignore
/// use ronda::traits::{ReturnMatrix, TimeSeries};
/// ```
pub mod traits {
    pub use ronda_traits::*;
}

// Re-export error and data types at top level for convenience
pub use ronda_traits::{Date, Result, ReturnMatrix, RondaError, SignalRule, Symbol, TimeSeries};

/// Principal-component decomposition and risk analytics.
///
/// ```ignore
/// use ronda::factors::{DecompositionConfig, decompose};
///
/// let factors = decompose(&returns, &DecompositionConfig::with_variance_threshold(0.9))?;
/// ```
pub mod factors {
    pub use ronda_factors::*;
}

/// Basket construction from component loadings.
pub mod combine {
    pub use ronda_combine::*;
}

/// Spread signals and price strategies.
///
/// ## Spread State Machine
///
/// | state | condition | signal | next |
/// |---|---|---|---|
/// | flat | z > entry | -1 | short |
/// | flat | z < -entry | 1 | long |
/// | long | z > -exit | -1 | flat |
/// | short | z < exit | 1 | flat |
///
/// Anything else emits 0 and keeps the state.
pub mod signals {
    pub use ronda_signals::*;
}

/// Backtesting and performance metrics.
///
/// ```text
/// r_t      = exposure_{t-1} · spread_t − cost · |exposure_t − exposure_{t-1}|
/// wealth_t = Π (1 + r_i)
/// sharpe   = (252 · mean(r) − rf) / (√252 · std(r))
/// ```
pub mod eval {
    pub use ronda_eval::*;
}
