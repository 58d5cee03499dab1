//! Engine settings with validating builders.
//!
//! Settings are plain values: construct them through the builders (which
//! validate at `build`) or deserialise them through
//! [`EngineConfig`](super::EngineConfig), which validates after parsing.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Default number of inventory grid points per time step.
pub const DEFAULT_NUM_GRID_POINTS: usize = 100;

/// Default lattice time step in years (one day).
pub const DEFAULT_TIME_STEP: f64 = 1.0 / 365.0;

/// Default absolute forward price bump for finite-difference deltas.
pub const DEFAULT_DELTA_BUMP: f64 = 1e-3;

/// Default tolerance for the inventory-space root solve.
pub const DEFAULT_SOLVER_TOLERANCE: f64 = 1e-10;

/// Default number of simulated scenarios.
pub const DEFAULT_NUM_SIMS: usize = 1000;

/// Settings for tree and intrinsic valuation.
///
/// # Examples
///
/// ```rust
/// use storage_pricing::config::TreeValuationSettings;
///
/// let settings = TreeValuationSettings::builder()
///     .num_inventory_grid_points(500)
///     .time_step(1.0 / 365.0)
///     .build()
///     .unwrap();
///
/// assert_eq!(settings.num_inventory_grid_points(), 500);
/// assert_eq!(settings.delta_bump(), 1e-3);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeValuationSettings {
    num_inventory_grid_points: usize,
    time_step: f64,
    delta_bump: f64,
    solver_tolerance: f64,
}

impl Default for TreeValuationSettings {
    fn default() -> Self {
        Self {
            num_inventory_grid_points: DEFAULT_NUM_GRID_POINTS,
            time_step: DEFAULT_TIME_STEP,
            delta_bump: DEFAULT_DELTA_BUMP,
            solver_tolerance: DEFAULT_SOLVER_TOLERANCE,
        }
    }
}

impl TreeValuationSettings {
    /// Creates a new settings builder.
    #[inline]
    pub fn builder() -> TreeValuationSettingsBuilder {
        TreeValuationSettingsBuilder::default()
    }

    /// Inventory grid points per time step.
    #[inline]
    pub fn num_inventory_grid_points(&self) -> usize {
        self.num_inventory_grid_points
    }

    /// Lattice time step in years.
    #[inline]
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Absolute forward price bump for deltas.
    #[inline]
    pub fn delta_bump(&self) -> f64 {
        self.delta_bump
    }

    /// Root-finding tolerance for inventory-space bounds.
    #[inline]
    pub fn solver_tolerance(&self) -> f64 {
        self.solver_tolerance
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidParameter` if:
    /// - `num_inventory_grid_points` is less than 2
    /// - `time_step`, `delta_bump` or `solver_tolerance` is not positive and finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_inventory_grid_points < 2 {
            return Err(ConfigError::InvalidParameter {
                name: "num_inventory_grid_points",
                value: format!("must be at least 2, got {}", self.num_inventory_grid_points),
            });
        }
        positive_finite("time_step", self.time_step)?;
        positive_finite("delta_bump", self.delta_bump)?;
        positive_finite("solver_tolerance", self.solver_tolerance)?;
        Ok(())
    }
}

/// Builder for [`TreeValuationSettings`].
#[derive(Clone, Debug, Default)]
pub struct TreeValuationSettingsBuilder {
    settings: TreeValuationSettings,
}

impl TreeValuationSettingsBuilder {
    /// Sets the number of inventory grid points (at least 2).
    #[inline]
    pub fn num_inventory_grid_points(mut self, points: usize) -> Self {
        self.settings.num_inventory_grid_points = points;
        self
    }

    /// Sets the lattice time step in years.
    #[inline]
    pub fn time_step(mut self, time_step: f64) -> Self {
        self.settings.time_step = time_step;
        self
    }

    /// Sets the delta bump size.
    #[inline]
    pub fn delta_bump(mut self, bump: f64) -> Self {
        self.settings.delta_bump = bump;
        self
    }

    /// Sets the root-finding tolerance.
    #[inline]
    pub fn solver_tolerance(mut self, tolerance: f64) -> Self {
        self.settings.solver_tolerance = tolerance;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// See [`TreeValuationSettings::validate`].
    pub fn build(self) -> Result<TreeValuationSettings, ConfigError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

/// Settings for multi-factor spot simulation.
///
/// # Examples
///
/// ```rust
/// use storage_pricing::config::SimulationSettings;
///
/// let settings = SimulationSettings::builder()
///     .num_sims(4)
///     .seed(12)
///     .build()
///     .unwrap();
///
/// assert_eq!(settings.seed(), 12);
/// assert!(!settings.antithetic());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    num_sims: usize,
    seed: u64,
    antithetic: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            num_sims: DEFAULT_NUM_SIMS,
            seed: 0,
            antithetic: false,
        }
    }
}

impl SimulationSettings {
    /// Creates a new settings builder.
    #[inline]
    pub fn builder() -> SimulationSettingsBuilder {
        SimulationSettingsBuilder::default()
    }

    /// Number of scenarios.
    #[inline]
    pub fn num_sims(&self) -> usize {
        self.num_sims
    }

    /// Random seed.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether odd scenarios reuse the negated draws of the preceding scenario.
    #[inline]
    pub fn antithetic(&self) -> bool {
        self.antithetic
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidParameter` if `num_sims` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_sims == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "num_sims",
                value: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for [`SimulationSettings`].
#[derive(Clone, Debug, Default)]
pub struct SimulationSettingsBuilder {
    settings: SimulationSettings,
}

impl SimulationSettingsBuilder {
    /// Sets the number of scenarios.
    #[inline]
    pub fn num_sims(mut self, num_sims: usize) -> Self {
        self.settings.num_sims = num_sims;
        self
    }

    /// Sets the random seed.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.settings.seed = seed;
        self
    }

    /// Enables antithetic pairing.
    #[inline]
    pub fn antithetic(mut self, antithetic: bool) -> Self {
        self.settings.antithetic = antithetic;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// See [`SimulationSettings::validate`].
    pub fn build(self) -> Result<SimulationSettings, ConfigError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

fn positive_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            value: format!("must be positive and finite, got {}", value),
        })
    }
}
