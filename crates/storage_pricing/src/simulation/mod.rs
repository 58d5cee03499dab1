//! Multi-factor spot price simulation.
//!
//! - [`MultiFactorSpotSimulator`]: Correlated mean-reverting factor paths anchored to a forward curve
//! - [`SimulationResult`]: Dense scenario x period spot matrix with per-factor states

mod result;
mod spot_sim;

pub use result::SimulationResult;
pub use spot_sim::MultiFactorSpotSimulator;
