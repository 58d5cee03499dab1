//! Root-finding solvers.
//!
//! - [`BrentSolver`]: Bracketed, derivative-free root finding
//! - [`SolverConfig`]: Tolerance and iteration limits
//!
//! # Example
//!
//! ```
//! use storage_core::math::solvers::{BrentSolver, SolverConfig};
//!
//! let solver = BrentSolver::new(SolverConfig::default());
//! let root = solver.find_root(|x: f64| x * x - 4.0, 0.0, 5.0).unwrap();
//! assert!((root - 2.0).abs() < 1e-10);
//! ```

mod brent;
mod config;

pub use brent::BrentSolver;
pub use config::{SolverConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
