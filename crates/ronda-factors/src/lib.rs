//! Factor decomposition and risk analytics for Ronda.
//!
//! This crate turns a dates × assets return matrix into its principal
//! components and derives the risk views built on top of them:
//! - Principal-component decomposition with explicit or variance-threshold
//!   component selection
//! - Annualized portfolio volatility and parametric Value-at-Risk
//! - Top contributing assets per component
//! - Linear regression of a market series on component scores
//! - Pearson correlation between aligned series
//!
//! # Example
//!
//! ```rust,ignore
//! use ronda_factors::{DecompositionConfig, analyze_risk_factors, decompose};
//!
//! let factors = decompose(&returns, &DecompositionConfig::with_variance_threshold(0.9))?;
//! let report = analyze_risk_factors(&factors, 5)?;
//! println!("PC1 leaders: {:?}", report.top_contributors[0].assets);
//! ```

pub mod correlation;
pub mod linalg;
pub mod pca;
pub mod regression;
pub mod risk;

// Re-export main types
pub use correlation::{CorrelationMatrix, correlation_matrix};
pub use pca::{
    Component, ComponentSelection, DecompositionConfig, FactorSet, decompose,
    select_component_count,
};
pub use regression::{ComponentRegression, regress_on_components};
pub use risk::{
    ComponentContributors, RiskConfig, RiskFactorReport, analyze_risk_factors,
    portfolio_volatility, value_at_risk,
};
