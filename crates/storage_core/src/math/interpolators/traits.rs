//! Interpolator trait.

use crate::types::InterpolationError;
use num_traits::Float;

/// One-dimensional interpolation over a fixed set of knots.
pub trait Interpolator<T: Float> {
    /// Interpolate at `x`, failing if `x` lies outside [`domain`](Self::domain).
    fn interpolate(&self, x: T) -> Result<T, InterpolationError>;

    /// Return the valid interpolation range `(x_min, x_max)`.
    fn domain(&self) -> (T, T);

    /// Interpolate at `x` with flat extrapolation outside the domain.
    ///
    /// Points below the domain take the first knot's value and points above
    /// take the last knot's value.
    #[inline]
    fn interpolate_flat(&self, x: T) -> Result<T, InterpolationError> {
        let (x_min, x_max) = self.domain();
        self.interpolate(x.max(x_min).min(x_max))
    }
}
