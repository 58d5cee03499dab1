//! Stochastic price dynamics.
//!
//! - [`correlation`]: Factor correlation and positive-semi-definite Cholesky
//! - [`multi_factor`]: Mean-reverting factor definitions and covariance analytics

pub mod correlation;
pub mod multi_factor;

pub use correlation::{psd_cholesky, CholeskyFactor, CorrelationError, CorrelationMatrix};
pub use multi_factor::{Factor, ModelError, MultiFactorModel};
