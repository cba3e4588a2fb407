#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for the Ronda factor research pipeline.
//!
//! This crate provides the foundational data types, the error taxonomy and
//! the signal rule abstraction shared by the decomposition, basket, signal
//! and evaluation crates.

/// The version of the ronda-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod signal;
pub mod stats;
pub mod types;

// Re-exports
pub use error::{Result, RondaError};
pub use signal::SignalRule;
pub use stats::TRADING_DAYS_PER_YEAR;
pub use types::{DATE_COLUMN, Date, ReturnMatrix, Symbol, TimeSeries, ensure_same_index};
