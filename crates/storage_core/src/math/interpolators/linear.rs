//! Linear interpolation implementation.

use super::Interpolator;
use crate::types::InterpolationError;
use num_traits::Float;

/// Piecewise linear interpolator.
///
/// Stores sorted (x, y) data points and performs linear interpolation
/// between adjacent points.
///
/// # Construction
///
/// Data points are sorted by x-coordinate during construction. At least 2
/// data points with distinct x-coordinates are required.
///
/// # Example
///
/// ```
/// use storage_core::math::interpolators::{Interpolator, LinearInterpolator};
///
/// // Ratchet pillar inventories against maximum injection rates
/// let interp = LinearInterpolator::new(&[0.0, 2000.0], &[255.2, 175.0]).unwrap();
/// assert_eq!(interp.domain(), (0.0, 2000.0));
///
/// let y: f64 = interp.interpolate(1000.0).unwrap();
/// assert!((y - 215.1).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator<T: Float> {
    /// Sorted x-coordinates
    xs: Vec<T>,
    /// Corresponding y-values (in same order as xs after sorting)
    ys: Vec<T>,
}

impl<T: Float> LinearInterpolator<T> {
    /// Construct a linear interpolator from x and y data points.
    ///
    /// # Returns
    ///
    /// * `Ok(LinearInterpolator)` - Successfully constructed interpolator
    /// * `Err(InterpolationError::InsufficientData)` - Fewer than 2 data points
    /// * `Err(InterpolationError::InvalidInput)` - Mismatched array lengths
    /// * `Err(InterpolationError::NonMonotonicData)` - Duplicate x-coordinates
    ///
    /// # Example
    ///
    /// ```
    /// use storage_core::math::interpolators::LinearInterpolator;
    ///
    /// assert!(LinearInterpolator::new(&[0.0, 1.0], &[0.0, 1.0]).is_ok());
    /// assert!(LinearInterpolator::new(&[0.0], &[0.0]).is_err());
    /// assert!(LinearInterpolator::new(&[1.0, 1.0], &[0.0, 2.0]).is_err());
    /// ```
    pub fn new(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        if xs.len() != ys.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "xs and ys must have same length: got {} and {}",
                xs.len(),
                ys.len()
            )));
        }

        if xs.len() < 2 {
            return Err(InterpolationError::InsufficientData {
                got: xs.len(),
                need: 2,
            });
        }

        let mut pairs: Vec<(T, T)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        for (index, window) in pairs.windows(2).enumerate() {
            if window[1].0 <= window[0].0 {
                return Err(InterpolationError::NonMonotonicData { index: index + 1 });
            }
        }

        let (sorted_xs, sorted_ys): (Vec<T>, Vec<T>) = pairs.into_iter().unzip();

        Ok(Self {
            xs: sorted_xs,
            ys: sorted_ys,
        })
    }

    /// Returns a reference to the sorted x-coordinates.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Returns a reference to the y-values (in sorted x order).
    #[inline]
    pub fn ys(&self) -> &[T] {
        &self.ys
    }

    /// Returns the number of data points.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Returns true if the interpolator has no data points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

impl<T: Float> Interpolator<T> for LinearInterpolator<T> {
    /// Interpolate value at point `x`.
    ///
    /// ```text
    /// y = y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    /// ```
    fn interpolate(&self, x: T) -> Result<T, InterpolationError> {
        let x_min = self.xs[0];
        let x_max = self.xs[self.xs.len() - 1];

        if x < x_min || x > x_max {
            return Err(InterpolationError::OutOfBounds {
                x: x.to_f64().unwrap_or(f64::NAN),
                min: x_min.to_f64().unwrap_or(f64::NAN),
                max: x_max.to_f64().unwrap_or(f64::NAN),
            });
        }

        let weights = GridWeights::locate(&self.xs, x);
        Ok(weights.apply(&self.ys))
    }

    #[inline]
    fn domain(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

/// Linear interpolation weights of a point against a sorted grid.
///
/// Locating once and applying to several value slices that share the same
/// grid avoids repeating the binary search. Points outside the grid are
/// clamped to the boundary knot (flat extrapolation).
///
/// # Example
///
/// ```
/// use storage_core::math::interpolators::GridWeights;
///
/// let grid = [0.0, 10.0, 20.0];
/// let w = GridWeights::locate(&grid, 12.5);
/// assert_eq!(w.apply(&[0.0, 100.0, 200.0]), 125.0);
/// assert_eq!(w.apply(&[1.0, 1.0, 3.0]), 1.5);
///
/// // Flat extrapolation
/// assert_eq!(GridWeights::locate(&grid, 25.0).apply(&[0.0, 100.0, 200.0]), 200.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridWeights<T: Float> {
    /// Index of the lower bracketing knot (the last knot when clamped above)
    pub lower: usize,
    /// Weight on the upper knot (`lower + 1`), in [0, 1); zero when clamped
    pub upper_weight: T,
}

impl<T: Float> GridWeights<T> {
    /// Locate `x` on a non-empty, strictly increasing grid.
    #[inline]
    pub fn locate(xs: &[T], x: T) -> Self {
        let n = xs.len();
        if n < 2 || x <= xs[0] {
            return Self {
                lower: 0,
                upper_weight: T::zero(),
            };
        }
        if x >= xs[n - 1] {
            return Self {
                lower: n - 1,
                upper_weight: T::zero(),
            };
        }

        // partition_point returns the first knot strictly greater than x
        let pos = xs.partition_point(|&xi| xi <= x);
        let lower = pos - 1;
        let t = (x - xs[lower]) / (xs[lower + 1] - xs[lower]);

        Self {
            lower,
            upper_weight: t,
        }
    }

    /// Apply the weights to values defined on the same grid.
    #[inline]
    pub fn apply(&self, ys: &[T]) -> T {
        let y0 = ys[self.lower];
        if self.upper_weight == T::zero() {
            return y0;
        }
        let y1 = ys[self.lower + 1];
        y0 + (y1 - y0) * self.upper_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    // ========================================
    // Construction Tests
    // ========================================

    #[test]
    fn test_new_insufficient_data_one_point() {
        let result = LinearInterpolator::new(&[1.0], &[2.0]);
        match result.unwrap_err() {
            InterpolationError::InsufficientData { got, need } => {
                assert_eq!(got, 1);
                assert_eq!(need, 2);
            }
            _ => panic!("Expected InsufficientData error"),
        }
    }

    #[test]
    fn test_new_mismatched_lengths() {
        let result = LinearInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0]);
        match result.unwrap_err() {
            InterpolationError::InvalidInput(msg) => assert!(msg.contains("same length")),
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn test_new_auto_sorts_unsorted_data() {
        let interp = LinearInterpolator::new(&[1800.0, 0.0, 700.0], &[174.45, 235.8, 200.77]).unwrap();
        assert_eq!(interp.xs(), &[0.0, 700.0, 1800.0]);
        assert_eq!(interp.ys(), &[235.8, 200.77, 174.45]);
    }

    // ========================================
    // Interpolation Tests
    // ========================================

    #[test]
    fn test_interpolate_at_knots() {
        let interp = LinearInterpolator::new(&[0.0, 700.0, 1800.0], &[235.8, 200.77, 174.45]).unwrap();
        assert_eq!(interp.interpolate(700.0).unwrap(), 200.77);
        assert_eq!(interp.interpolate(1800.0).unwrap(), 174.45);
    }

    #[test]
    fn test_interpolate_midpoint() {
        let interp = LinearInterpolator::new(&[0.0, 2000.0], &[-150.0, -200.0]).unwrap();
        assert_relative_eq!(interp.interpolate(1000.0).unwrap(), -175.0, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_bounds() {
        let interp = LinearInterpolator::new(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        assert!(matches!(
            interp.interpolate(1.5),
            Err(InterpolationError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_interpolate_flat_clamps() {
        let interp = LinearInterpolator::new(&[0.0, 2000.0], &[255.2, 175.0]).unwrap();
        assert_eq!(interp.interpolate_flat(-10.0).unwrap(), 255.2);
        assert_eq!(interp.interpolate_flat(5000.0).unwrap(), 175.0);
    }

    #[test]
    fn test_grid_weights_single_point_grid() {
        let w = GridWeights::locate(&[5.0], 8.0);
        assert_eq!(w.apply(&[3.0]), 3.0);
    }

    proptest! {
        #[test]
        fn test_interpolation_within_bracket(x in 0.0f64..2000.0) {
            let interp = LinearInterpolator::new(&[0.0, 700.0, 2000.0], &[10.0, 4.0, 7.0]).unwrap();
            let y = interp.interpolate(x).unwrap();
            prop_assert!(y >= 4.0 - 1e-12 && y <= 10.0 + 1e-12);
        }
    }
}
