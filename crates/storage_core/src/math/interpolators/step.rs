//! Step (piecewise-constant) interpolation.

use super::Interpolator;
use crate::types::InterpolationError;
use num_traits::Float;

/// Piecewise-constant interpolator taking the value of the nearest knot at
/// or below the query point.
///
/// A single knot is allowed; the interpolator is then constant.
///
/// # Example
///
/// ```
/// use storage_core::math::interpolators::{Interpolator, StepInterpolator};
///
/// let interp = StepInterpolator::new(&[0.0, 700.0, 1800.0], &[235.8, 200.77, 174.45]).unwrap();
/// assert_eq!(interp.interpolate(699.9).unwrap(), 235.8);
/// assert_eq!(interp.interpolate(700.0).unwrap(), 200.77);
/// assert_eq!(interp.interpolate_flat(2500.0).unwrap(), 174.45);
/// ```
#[derive(Debug, Clone)]
pub struct StepInterpolator<T: Float> {
    xs: Vec<T>,
    ys: Vec<T>,
}

impl<T: Float> StepInterpolator<T> {
    /// Construct from strictly increasing `xs` and matching `ys`.
    pub fn new(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        if xs.len() != ys.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "xs and ys must have same length: got {} and {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.is_empty() {
            return Err(InterpolationError::InsufficientData { got: 0, need: 1 });
        }
        for (index, window) in xs.windows(2).enumerate() {
            if window[1] <= window[0] {
                return Err(InterpolationError::NonMonotonicData { index: index + 1 });
            }
        }
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    /// Returns the knot x-coordinates.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }
}

impl<T: Float> Interpolator<T> for StepInterpolator<T> {
    fn interpolate(&self, x: T) -> Result<T, InterpolationError> {
        let (x_min, x_max) = self.domain();
        if x < x_min || x > x_max {
            return Err(InterpolationError::OutOfBounds {
                x: x.to_f64().unwrap_or(f64::NAN),
                min: x_min.to_f64().unwrap_or(f64::NAN),
                max: x_max.to_f64().unwrap_or(f64::NAN),
            });
        }
        let pos = self.xs.partition_point(|&xi| xi <= x);
        Ok(self.ys[pos.saturating_sub(1)])
    }

    #[inline]
    fn domain(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}
