//! Numerical building blocks.
//!
//! - [`interpolators`]: Linear and step interpolation, grid weights
//! - [`solvers`]: Brent root finding

pub mod interpolators;
pub mod solvers;
