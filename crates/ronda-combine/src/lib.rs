//! Factor-replicating basket construction for Ronda.
//!
//! A basket is a fixed linear combination of asset returns. Its weights come
//! from one component's loadings, rescaled so that gross exposure is one,
//! and pricing it is a matrix-vector product per date.
//!
//! # Examples
//!
//! ```rust,ignore
//! use ronda_combine::{BasketWeights, basket_returns};
//!
//! let weights = BasketWeights::dominant(&factors)?;
//! let basket = basket_returns(&returns, &weights)?;
//! ```

mod pricing;
mod weights;

// Re-export main types
pub use pricing::{BASKET_SERIES, basket_returns};
pub use weights::{BasketWeights, DOMINANT_COMPONENT};
