//! Time-indexed curve of doubles.

use crate::market_data::error::CurveError;
use crate::types::TimePeriod;

/// Mapping from period to value with unique, strictly increasing periods.
///
/// Queried by exact period: a lookup for a period with no entry fails
/// rather than interpolating.
///
/// # Examples
///
/// ```
/// use storage_core::market_data::Curve;
/// use storage_core::types::Day;
///
/// let start = Day::from_ymd(2019, 8, 28).unwrap();
/// let curve = Curve::from_contiguous(start, &[58.89, 61.41, 59.89]).unwrap();
///
/// assert_eq!(curve.len(), 3);
/// assert_eq!(curve.get(&Day::from_ymd(2019, 8, 29).unwrap()).unwrap(), 61.41);
/// assert!(curve.get(&Day::from_ymd(2019, 9, 1).unwrap()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Curve<P: TimePeriod> {
    periods: Vec<P>,
    values: Vec<f64>,
}

impl<P: TimePeriod> Curve<P> {
    /// Construct a curve from `(period, value)` pairs already in period order.
    ///
    /// # Errors
    ///
    /// - `CurveError::Empty` if no points are supplied
    /// - `CurveError::NonIncreasingPeriods` if periods are not strictly increasing
    /// - `CurveError::NonFiniteValue` if any value is NaN or infinite
    pub fn new<I>(points: I) -> Result<Self, CurveError>
    where
        I: IntoIterator<Item = (P, f64)>,
    {
        let (periods, values): (Vec<P>, Vec<f64>) = points.into_iter().unzip();
        if periods.is_empty() {
            return Err(CurveError::Empty);
        }
        for (index, window) in periods.windows(2).enumerate() {
            if window[1] <= window[0] {
                return Err(CurveError::NonIncreasingPeriods { index: index + 1 });
            }
        }
        for (period, value) in periods.iter().zip(&values) {
            if !value.is_finite() {
                return Err(CurveError::NonFiniteValue {
                    period: period.to_string(),
                    value: *value,
                });
            }
        }
        Ok(Self { periods, values })
    }

    /// Construct a curve over consecutive periods beginning at `start`.
    pub fn from_contiguous(start: P, values: &[f64]) -> Result<Self, CurveError> {
        Self::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &value)| (start.offset(i as i64), value)),
        )
    }

    /// Construct a curve holding `value` for every period in `[start, end]`.
    pub fn constant(start: P, end: P, value: f64) -> Result<Self, CurveError> {
        Self::new(start.range_inclusive(&end).map(|p| (p, value)))
    }

    /// Construct a piecewise-flat curve over every period up to `end` inclusive.
    ///
    /// Each pillar's value applies from its own period up to (not including)
    /// the next pillar; the last pillar's value extends to `end`.
    ///
    /// # Examples
    ///
    /// ```
    /// use storage_core::market_data::Curve;
    /// use storage_core::types::Day;
    ///
    /// let d = |m, d| Day::from_ymd(2019, m, d).unwrap();
    /// let curve = Curve::piecewise_flat(&[(d(8, 28), 2.4), (d(9, 1), 1.2)], d(9, 3)).unwrap();
    ///
    /// assert_eq!(curve.get(&d(8, 31)).unwrap(), 2.4);
    /// assert_eq!(curve.get(&d(9, 1)).unwrap(), 1.2);
    /// assert_eq!(curve.get(&d(9, 3)).unwrap(), 1.2);
    /// assert_eq!(curve.len(), 7);
    /// ```
    pub fn piecewise_flat(pillars: &[(P, f64)], end: P) -> Result<Self, CurveError> {
        let (first, _) = pillars.first().ok_or(CurveError::Empty)?;
        let (last, _) = pillars[pillars.len() - 1];
        if end < last {
            return Err(CurveError::InvalidInput(format!(
                "end {} precedes last pillar {}",
                end, last
            )));
        }
        for (index, window) in pillars.windows(2).enumerate() {
            if window[1].0 <= window[0].0 {
                return Err(CurveError::NonIncreasingPeriods { index: index + 1 });
            }
        }

        let mut points = Vec::with_capacity((end.periods_since(first) + 1).max(0) as usize);
        let mut pillar_idx = 0;
        for period in first.range_inclusive(&end) {
            while pillar_idx + 1 < pillars.len() && pillars[pillar_idx + 1].0 <= period {
                pillar_idx += 1;
            }
            points.push((period, pillars[pillar_idx].1));
        }
        Self::new(points)
    }

    /// Returns the value at `period`.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::MissingPeriod` if the curve has no entry for `period`.
    #[inline]
    pub fn get(&self, period: &P) -> Result<f64, CurveError> {
        self.try_get(period).ok_or_else(|| CurveError::MissingPeriod {
            period: period.to_string(),
        })
    }

    /// Returns the value at `period`, or `None` if absent.
    #[inline]
    pub fn try_get(&self, period: &P) -> Option<f64> {
        self.periods
            .binary_search(period)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// Returns true if the curve has an entry for `period`.
    #[inline]
    pub fn contains(&self, period: &P) -> bool {
        self.periods.binary_search(period).is_ok()
    }

    /// Returns the earliest period.
    #[inline]
    pub fn first_period(&self) -> P {
        self.periods[0]
    }

    /// Returns the latest period.
    #[inline]
    pub fn last_period(&self) -> P {
        self.periods[self.periods.len() - 1]
    }

    /// Returns the number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Always false for a constructed curve.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Returns the periods in order.
    #[inline]
    pub fn periods(&self) -> &[P] {
        &self.periods
    }

    /// Returns the values in period order.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterates over `(period, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (P, f64)> + '_ {
        self.periods.iter().copied().zip(self.values.iter().copied())
    }

    /// Returns a copy with `amount` added to every value whose period lies in
    /// `[first, last]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use storage_core::market_data::Curve;
    /// use storage_core::types::{Day, TimePeriod};
    ///
    /// let start = Day::from_ymd(2019, 12, 1).unwrap();
    /// let curve = Curve::from_contiguous(start, &[10.0, 10.0, 10.0]).unwrap();
    /// let bumped = curve.bumped(&start.offset(1), &start.offset(5), 0.5);
    /// assert_eq!(bumped.values(), &[10.0, 10.5, 10.5]);
    /// ```
    pub fn bumped(&self, first: &P, last: &P, amount: f64) -> Self {
        let values = self
            .periods
            .iter()
            .zip(&self.values)
            .map(|(p, &v)| if p >= first && p <= last { v + amount } else { v })
            .collect();
        Self {
            periods: self.periods.clone(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Day;

    fn day(m: u32, d: u32) -> Day {
        Day::from_ymd(2019, m, d).unwrap()
    }

    #[test]
    fn test_empty_rejected() {
        let result = Curve::<Day>::new(Vec::new());
        assert_eq!(result, Err(CurveError::Empty));
    }

    #[test]
    fn test_non_increasing_rejected() {
        let result = Curve::new(vec![(day(8, 28), 1.0), (day(8, 28), 2.0)]);
        assert_eq!(result, Err(CurveError::NonIncreasingPeriods { index: 1 }));

        let result = Curve::new(vec![(day(8, 28), 1.0), (day(8, 27), 2.0)]);
        assert!(matches!(result, Err(CurveError::NonIncreasingPeriods { .. })));
    }

    #[test]
    fn test_nan_rejected() {
        let result = Curve::new(vec![(day(8, 28), f64::NAN)]);
        assert!(matches!(result, Err(CurveError::NonFiniteValue { .. })));
    }

    #[test]
    fn test_sparse_lookup() {
        let curve = Curve::new(vec![(day(8, 28), 1.0), (day(9, 10), 2.0)]).unwrap();
        assert_eq!(curve.get(&day(9, 10)).unwrap(), 2.0);
        assert_eq!(
            curve.get(&day(9, 1)),
            Err(CurveError::MissingPeriod {
                period: "2019-09-01".to_string()
            })
        );
    }

    #[test]
    fn test_piecewise_flat_matches_pillars() {
        let curve = Curve::piecewise_flat(
            &[
                (day(8, 28), 2.4),
                (day(9, 1), 1.2),
                (day(9, 10), 0.0),
                (day(9, 25), 0.0),
            ],
            day(9, 25),
        )
        .unwrap();
        assert_eq!(curve.first_period(), day(8, 28));
        assert_eq!(curve.last_period(), day(9, 25));
        assert_eq!(curve.get(&day(8, 31)).unwrap(), 2.4);
        assert_eq!(curve.get(&day(9, 9)).unwrap(), 1.2);
        assert_eq!(curve.get(&day(9, 10)).unwrap(), 0.0);
    }

    #[test]
    fn test_piecewise_flat_end_before_last_pillar() {
        let result = Curve::piecewise_flat(&[(day(8, 28), 1.0), (day(9, 1), 2.0)], day(8, 30));
        assert!(matches!(result, Err(CurveError::InvalidInput(_))));
    }

    #[test]
    fn test_constant() {
        let curve = Curve::constant(day(8, 28), day(9, 25), 0.03).unwrap();
        assert_eq!(curve.len(), 29);
        assert!(curve.values().iter().all(|&v| v == 0.03));
    }
}
