//! Signal rule trait for generating discrete trading signals.
//!
//! A `SignalRule` walks a dated series once, in chronological order, and
//! emits one signal per row: `1` (buy / long), `-1` (sell / short) or `0`
//! (no action). What a non-zero value means for an open position is up to
//! the rule; the spread engine, for instance, reuses `1`/`-1` as exits.

use crate::{Result, TimeSeries};

/// A rule mapping a dated series to a signal series of the same length.
///
/// Implementations must be pure: the same input always yields the same
/// signals and no state survives between calls. They are `Send + Sync` so
/// independent runs can be spread across threads.
///
/// # Example
///
/// ```
/// use ronda_traits::{Result, SignalRule, TimeSeries};
///
/// struct AlwaysFlat;
///
/// impl SignalRule for AlwaysFlat {
///     fn name(&self) -> &str {
///         "always_flat"
///     }
///
///     fn lookback(&self) -> usize {
///         0
///     }
///
///     fn generate(&self, series: &TimeSeries) -> Result<Vec<i8>> {
///         Ok(vec![0; series.len()])
///     }
/// }
/// ```
pub trait SignalRule: Send + Sync {
    /// Returns the name of this rule, used in logs and reports.
    fn name(&self) -> &str;

    /// Number of leading observations needed before the rule can fire.
    fn lookback(&self) -> usize;

    /// Generates one signal in `{-1, 0, 1}` per row of `series`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid for this series
    /// (for example a window longer than the series).
    fn generate(&self, series: &TimeSeries) -> Result<Vec<i8>>;
}
