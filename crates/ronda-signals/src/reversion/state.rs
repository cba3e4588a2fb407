//! Position state machine driven by a z-score sequence.
//!
//! Signals reuse `1`/`-1` for both entries and exits: while flat, `-1`
//! enters short and `1` enters long; while in a position the opposite value
//! closes it. The state carried alongside each signal disambiguates.

use std::fmt;

use ronda_traits::{Result, RondaError};
use serde::{Deserialize, Serialize};

/// Position held on the spread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    /// No position.
    #[default]
    Flat,
    /// Long the spread (expects it to rise back to its mean).
    LongSpread,
    /// Short the spread (expects it to fall back to its mean).
    ShortSpread,
}

impl PositionState {
    /// Signed exposure of the state: `1`, `-1` or `0`.
    #[must_use]
    pub const fn exposure(self) -> i8 {
        match self {
            Self::Flat => 0,
            Self::LongSpread => 1,
            Self::ShortSpread => -1,
        }
    }

    /// Short label used in tables and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::LongSpread => "long",
            Self::ShortSpread => "short",
        }
    }
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry and exit z-score thresholds, `0 ≤ exit < entry`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    entry: f64,
    exit: f64,
}

impl Thresholds {
    /// Validates and builds a threshold pair.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidConfig`] unless `entry > 0`,
    /// `0 ≤ exit < entry` and both are finite.
    pub fn new(entry: f64, exit: f64) -> Result<Self> {
        if !entry.is_finite() || entry <= 0.0 {
            return Err(RondaError::InvalidConfig(format!(
                "entry_z must be a positive number, got {entry}"
            )));
        }
        if !exit.is_finite() || exit < 0.0 || exit >= entry {
            return Err(RondaError::InvalidConfig(format!(
                "exit_z must satisfy 0 <= exit_z < entry_z ({entry}), got {exit}"
            )));
        }
        Ok(Self { entry, exit })
    }

    /// Entry threshold.
    pub const fn entry(&self) -> f64 {
        self.entry
    }

    /// Exit threshold.
    pub const fn exit(&self) -> f64 {
        self.exit
    }
}

/// One step of the state machine.
///
/// Returns the emitted signal and the state after the step. A missing
/// z-score emits `0` and leaves the state unchanged.
#[must_use]
pub fn transition(
    state: PositionState,
    z: Option<f64>,
    thresholds: &Thresholds,
) -> (i8, PositionState) {
    let Some(z) = z else {
        return (0, state);
    };
    match state {
        PositionState::Flat if z > thresholds.entry => (-1, PositionState::ShortSpread),
        PositionState::Flat if z < -thresholds.entry => (1, PositionState::LongSpread),
        PositionState::LongSpread if z > -thresholds.exit => (-1, PositionState::Flat),
        PositionState::ShortSpread if z < thresholds.exit => (1, PositionState::Flat),
        _ => (0, state),
    }
}

/// Lazily walks a z-score sequence, starting flat.
///
/// Yields `(signal, state_after)` for every input row.
#[derive(Debug, Clone)]
pub struct SignalWalk<I> {
    zscores: I,
    state: PositionState,
    thresholds: Thresholds,
}

impl<I> SignalWalk<I>
where
    I: Iterator<Item = Option<f64>>,
{
    /// Starts a walk in the flat state.
    pub const fn new(zscores: I, thresholds: Thresholds) -> Self {
        Self {
            zscores,
            state: PositionState::Flat,
            thresholds,
        }
    }
}

impl<I> Iterator for SignalWalk<I>
where
    I: Iterator<Item = Option<f64>>,
{
    type Item = (i8, PositionState);

    fn next(&mut self) -> Option<Self::Item> {
        let z = self.zscores.next()?;
        let (signal, next) = transition(self.state, z, &self.thresholds);
        self.state = next;
        Some((signal, next))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.zscores.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PositionState::{Flat, LongSpread, ShortSpread};

    fn thresholds() -> Thresholds {
        Thresholds::new(2.0, 0.5).unwrap()
    }

    #[test]
    fn test_flat_transitions() {
        let t = thresholds();
        assert_eq!(transition(Flat, Some(2.1), &t), (-1, ShortSpread));
        assert_eq!(transition(Flat, Some(-2.1), &t), (1, LongSpread));
        assert_eq!(transition(Flat, Some(2.0), &t), (0, Flat));
        assert_eq!(transition(Flat, Some(-2.0), &t), (0, Flat));
    }

    #[test]
    fn test_long_exit() {
        let t = thresholds();
        assert_eq!(transition(LongSpread, Some(-0.4), &t), (-1, Flat));
        assert_eq!(transition(LongSpread, Some(-0.5), &t), (0, LongSpread));
        assert_eq!(transition(LongSpread, Some(-3.0), &t), (0, LongSpread));
    }

    #[test]
    fn test_short_exit() {
        let t = thresholds();
        assert_eq!(transition(ShortSpread, Some(0.4), &t), (1, Flat));
        assert_eq!(transition(ShortSpread, Some(0.5), &t), (0, ShortSpread));
        // No direct flip from short to long.
        assert_eq!(transition(ShortSpread, Some(-2.5), &t), (1, Flat));
    }

    #[test]
    fn test_missing_zscore_holds_state() {
        let t = thresholds();
        for state in [Flat, LongSpread, ShortSpread] {
            assert_eq!(transition(state, None, &t), (0, state));
        }
    }

    #[test]
    fn test_walk_is_lazy_and_stateful() {
        let z = [Some(2.5), None, Some(0.1), Some(0.1)];
        let steps: Vec<_> = SignalWalk::new(z.into_iter(), thresholds()).collect();
        assert_eq!(
            steps,
            vec![(-1, ShortSpread), (0, ShortSpread), (1, Flat), (0, Flat)]
        );
    }

    #[test]
    fn test_threshold_validation() {
        assert!(Thresholds::new(0.0, 0.0).is_err());
        assert!(Thresholds::new(2.0, 2.0).is_err());
        assert!(Thresholds::new(2.0, -0.1).is_err());
        assert!(Thresholds::new(f64::NAN, 0.5).is_err());
        assert!(Thresholds::new(2.0, 0.0).is_ok());
    }

    #[test]
    fn test_exposure() {
        assert_eq!(Flat.exposure(), 0);
        assert_eq!(LongSpread.exposure(), 1);
        assert_eq!(ShortSpread.exposure(), -1);
        assert_eq!(LongSpread.to_string(), "long");
    }
}
