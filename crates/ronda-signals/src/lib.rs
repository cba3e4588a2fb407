//! Spread signal engine and price strategies for Ronda.
//!
//! This crate turns return and price series into discrete signals:
//! - Basket-versus-benchmark spread with a rolling z-score
//! - A pure position state machine for spread mean reversion
//! - Golden-cross, mean-reversion and momentum rules on close prices
//!
//! Every rule implements [`ronda_traits::SignalRule`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ronda_signals::{ReversionConfig, SpreadReversion, compute_spread};
//!
//! let spread = compute_spread(&basket, &benchmark)?;
//! let signals = SpreadReversion::new(ReversionConfig::default()).run(&spread)?;
//! println!("positions: {:?}", signals.positions());
//! ```

pub mod reversion;
pub mod spread;
pub mod strategy;
pub mod trend;

// Re-export main types
pub use reversion::{
    PositionState, ReversionConfig, SignalSeries, SignalWalk, SpreadReversion, Thresholds,
    transition,
};
pub use spread::{SPREAD_SERIES, compute_spread, rolling_zscore, validate_window};
pub use strategy::StrategyKind;
pub use trend::{TrendCrossovers, crossover_signals, identify_trends};
