//! Interpolation methods for numerical computation.
//!
//! ## Available Interpolators
//!
//! - [`LinearInterpolator`]: Piecewise linear interpolation between data points
//! - [`StepInterpolator`]: Piecewise-constant (last knot at or below) interpolation
//! - [`GridWeights`]: Reusable linear weights against a sorted grid
//!
//! ## Core Trait
//!
//! All interpolators implement the [`Interpolator`] trait, which defines:
//! - `interpolate(x: T) -> Result<T, InterpolationError>`: Compute interpolated value
//! - `domain() -> (T, T)`: Return valid interpolation range
//! - `interpolate_flat(x: T)`: Flat extrapolation outside the domain
//!
//! ## Example
//!
//! ```
//! use storage_core::math::interpolators::{Interpolator, LinearInterpolator};
//!
//! let interp = LinearInterpolator::new(&[0.0, 700.0], &[-170.5, -180.2]).unwrap();
//! let y: f64 = interp.interpolate(350.0).unwrap();
//! assert!((y + 175.35).abs() < 1e-10);
//! ```

mod linear;
mod step;
mod traits;

pub use linear::{GridWeights, LinearInterpolator};
pub use step::StepInterpolator;
pub use traits::Interpolator;
