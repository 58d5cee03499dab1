//! Random number generation for spot simulation.
//!
//! - [`ScenarioRng`]: Seeded standard normal generator
//! - [`stream_seed`]: Deterministic sub-stream seeding from `(seed, index)`

mod prng;

pub use prng::{stream_seed, ScenarioRng};
