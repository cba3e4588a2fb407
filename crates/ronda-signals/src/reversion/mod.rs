//! Mean reversion on the basket-versus-benchmark spread.
//!
//! - [`state`]: the pure position state machine
//! - [`engine`]: rolling z-score plus the walk over a spread series

mod engine;
mod state;

pub use engine::{ReversionConfig, SignalSeries, SpreadReversion};
pub use state::{PositionState, SignalWalk, Thresholds, transition};
