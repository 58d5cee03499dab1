//! Engine configuration.
//!
//! - [`TreeValuationSettings`]: Grid density, time step, delta bump, solver tolerance
//! - [`SimulationSettings`]: Scenario count, seed, antithetic pairing
//! - [`EngineConfig`]: Both, loadable from TOML or JSON
//! - [`RunControl`]: Cooperative cancellation and progress reporting

mod control;
mod error;
mod loader;
mod settings;

pub use control::{CancellationToken, ProgressCallback, RunControl};
pub use error::ConfigError;
pub use loader::EngineConfig;
pub use settings::{
    SimulationSettings, SimulationSettingsBuilder, TreeValuationSettings,
    TreeValuationSettingsBuilder, DEFAULT_DELTA_BUMP, DEFAULT_NUM_GRID_POINTS, DEFAULT_NUM_SIMS,
    DEFAULT_SOLVER_TOLERANCE, DEFAULT_TIME_STEP,
};
