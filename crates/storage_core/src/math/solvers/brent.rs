//! Brent's method root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;
use num_traits::Float;

/// Brent's method root finder.
///
/// Combines bisection, secant, and inverse quadratic interpolation.
/// Converges for continuous functions with a valid bracket. Used to invert
/// inventory-dependent injection/withdrawal envelopes.
///
/// # Example
///
/// ```
/// use storage_core::math::solvers::{BrentSolver, SolverConfig};
///
/// let solver = BrentSolver::new(SolverConfig::default());
///
/// // Inventory x such that x less a 0.1% loss plus a 175 injection reaches 1000
/// let f = |x: f64| x * (1.0 - 0.001) + 175.0 - 1000.0;
///
/// let root = solver.find_root(f, 0.0, 1000.0).unwrap();
/// assert!(f(root).abs() < 1e-8);
/// ```
#[derive(Debug, Clone)]
pub struct BrentSolver<T: Float> {
    /// Solver configuration
    config: SolverConfig<T>,
}

impl<T: Float> BrentSolver<T> {
    /// Create a new Brent solver with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Solver configuration with tolerance and max iterations
    ///
    /// # Example
    ///
    /// ```
    /// use storage_core::math::solvers::{BrentSolver, SolverConfig};
    ///
    /// let solver: BrentSolver<f64> = BrentSolver::new(SolverConfig::default());
    /// ```
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: SolverConfig::default(),
        }
    }

    /// Find a root of `f` in the bracket [a, b].
    ///
    /// Requires that `f(a)` and `f(b)` have opposite signs (a valid bracket).
    ///
    /// # Arguments
    ///
    /// * `f` - Function to find root of
    /// * `a` - Left bracket endpoint
    /// * `b` - Right bracket endpoint
    ///
    /// # Returns
    ///
    /// * `Ok(x)` - Root where `|f(x)| < tolerance`
    /// * `Err(SolverError::NoBracket)` - `f(a)` and `f(b)` have same sign
    /// * `Err(SolverError::MaxIterationsExceeded)` - Failed to converge
    ///
    /// # Example
    ///
    /// ```
    /// use storage_core::math::solvers::{BrentSolver, SolverConfig};
    ///
    /// let solver = BrentSolver::new(SolverConfig::default());
    ///
    /// // Solve x² - 2 = 0 in bracket [0, 2]
    /// let f = |x: f64| x * x - 2.0;
    ///
    /// let root = solver.find_root(f, 0.0, 2.0).unwrap();
    /// assert!((root - std::f64::consts::SQRT_2).abs() < 1e-10);
    /// ```
    pub fn find_root<F>(&self, f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        let zero = T::zero();
        let two = T::one() + T::one();
        let half = two.recip();
        let tol = self.config.tolerance;

        let (mut a, mut b) = (a, b);
        let (mut fa, mut fb) = (f(a), f(b));

        if fa == zero {
            return Ok(a);
        }
        if fb == zero {
            return Ok(b);
        }
        if (fa > zero) == (fb > zero) {
            return Err(SolverError::NoBracket {
                a: a.to_f64().unwrap_or(f64::NAN),
                b: b.to_f64().unwrap_or(f64::NAN),
            });
        }

        // c is the contrapoint: f(b) and f(c) always straddle the root
        let (mut c, mut fc) = (b, fb);
        let mut step = b - a;
        let mut prev_step = step;

        for _ in 0..self.config.max_iterations {
            if (fb > zero) == (fc > zero) {
                c = a;
                fc = fa;
                step = b - a;
                prev_step = step;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let half_width = half * (c - b);
            if fb.abs() < tol || half_width.abs() <= tol {
                return Ok(b);
            }

            let interpolation_ok = prev_step.abs() >= tol && fa.abs() > fb.abs();
            if interpolation_ok {
                let s = fb / fa;
                let (p, q) = if a == c {
                    // Secant step
                    (two * half_width * s, T::one() - s)
                } else {
                    // Inverse quadratic step
                    let q = fa / fc;
                    let r = fb / fc;
                    (
                        s * (two * half_width * q * (q - r) - (b - a) * (r - T::one())),
                        (q - T::one()) * (r - T::one()) * (s - T::one()),
                    )
                };
                let (p, q) = if p > zero { (p, -q) } else { (-p, q) };

                let bound_interp = (two + T::one()) * half_width * q - (tol * q).abs();
                let bound_prev = (prev_step * q).abs();
                if two * p < bound_interp.min(bound_prev) {
                    prev_step = step;
                    step = p / q;
                } else {
                    step = half_width;
                    prev_step = half_width;
                }
            } else {
                step = half_width;
                prev_step = half_width;
            }

            a = b;
            fa = fb;
            b = if step.abs() > tol {
                b + step
            } else if half_width > zero {
                b + tol
            } else {
                b - tol
            };
            fb = f(b);
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        })
    }

    /// Returns a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }
}
