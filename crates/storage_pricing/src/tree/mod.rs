//! One-factor trinomial tree valuation.
//!
//! - [`TrinomialLattice`]: Mean-reverting log-price lattice fitted to the forward curve
//! - [`TrinomialTreeEngine`]: Backward induction over lattice x inventory, with deltas
//! - [`DeltaContract`]: Forward contract a delta is reported against
//! - [`TreeValuationResults`]: NPV, deltas and lattice spot prices

mod engine;
mod lattice;
mod results;

pub use engine::TrinomialTreeEngine;
pub use lattice::{Transition, TrinomialLattice};
pub use results::{DeltaContract, TreeValuationResults};
