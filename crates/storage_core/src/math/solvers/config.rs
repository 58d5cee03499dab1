//! Solver configuration types.

use num_traits::Float;

/// Default convergence tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default iteration limit.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Configuration for root-finding algorithms.
///
/// # Example
///
/// ```
/// use storage_core::math::solvers::SolverConfig;
///
/// let config: SolverConfig<f64> = SolverConfig::default();
/// assert_eq!(config.tolerance, 1e-10);
/// assert_eq!(config.max_iterations, 100);
///
/// let custom = SolverConfig::new(1e-12, 200);
/// assert_eq!(custom.max_iterations, 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig<T: Float> {
    /// Convergence tolerance; the solver stops when `|f(x)| < tolerance`
    /// or the bracket half-width falls below it.
    pub tolerance: T,

    /// Maximum number of iterations before giving up.
    pub max_iterations: usize,
}

impl<T: Float> Default for SolverConfig<T> {
    fn default() -> Self {
        Self {
            tolerance: T::from(DEFAULT_TOLERANCE).unwrap_or_else(T::epsilon),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl<T: Float> SolverConfig<T> {
    /// Create a new configuration with specified values.
    ///
    /// Non-positive tolerances and zero iteration counts fall back to the
    /// defaults.
    pub fn new(tolerance: T, max_iterations: usize) -> Self {
        let defaults = Self::default();
        Self {
            tolerance: if tolerance > T::zero() {
                tolerance
            } else {
                defaults.tolerance
            },
            max_iterations: if max_iterations > 0 {
                max_iterations
            } else {
                defaults.max_iterations
            },
        }
    }
}
