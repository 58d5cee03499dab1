//! Uniform access to scalar-or-curve inputs.

use super::Curve;
use crate::market_data::error::CurveError;
use crate::types::TimePeriod;

/// Either a scalar constant, a time-indexed curve, or nothing.
///
/// Every cost, volatility and rate input of the storage model is expressed
/// through this enum so that callers can supply whichever form they hold.
/// An absent input contributes zero.
///
/// # Examples
///
/// ```
/// use storage_core::market_data::{Curve, CurveAccessor};
/// use storage_core::types::Day;
///
/// let day = Day::from_ymd(2019, 8, 29).unwrap();
///
/// let constant: CurveAccessor<Day> = 0.015.into();
/// assert_eq!(constant.value(&day).unwrap(), 0.015);
///
/// let absent = CurveAccessor::<Day>::Absent;
/// assert_eq!(absent.value(&day).unwrap(), 0.0);
///
/// let curve: CurveAccessor<Day> = Curve::from_contiguous(day, &[1.5]).unwrap().into();
/// assert_eq!(curve.value(&day).unwrap(), 1.5);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CurveAccessor<P: TimePeriod> {
    /// No input supplied; evaluates to zero everywhere.
    #[default]
    Absent,
    /// Same value for every period.
    Constant(f64),
    /// Period-dependent values.
    Curve(Curve<P>),
}

impl<P: TimePeriod> CurveAccessor<P> {
    /// Returns the value for `period`.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::MissingPeriod` if this is a curve without an
    /// entry for `period`.
    #[inline]
    pub fn value(&self, period: &P) -> Result<f64, CurveError> {
        match self {
            CurveAccessor::Absent => Ok(0.0),
            CurveAccessor::Constant(value) => Ok(*value),
            CurveAccessor::Curve(curve) => curve.get(period),
        }
    }

    /// Returns true if no input was supplied.
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, CurveAccessor::Absent)
    }

    /// Returns true if the accessor holds a scalar constant.
    #[inline]
    pub fn is_constant(&self) -> bool {
        matches!(self, CurveAccessor::Constant(_))
    }
}

impl<P: TimePeriod> From<f64> for CurveAccessor<P> {
    fn from(value: f64) -> Self {
        CurveAccessor::Constant(value)
    }
}

impl<P: TimePeriod> From<Curve<P>> for CurveAccessor<P> {
    fn from(curve: Curve<P>) -> Self {
        CurveAccessor::Curve(curve)
    }
}

impl<P: TimePeriod, T: Into<CurveAccessor<P>>> From<Option<T>> for CurveAccessor<P> {
    fn from(value: Option<T>) -> Self {
        value.map_or(CurveAccessor::Absent, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Day;

    #[test]
    fn test_default_is_absent() {
        let accessor: CurveAccessor<Day> = CurveAccessor::default();
        assert!(accessor.is_absent());
    }

    #[test]
    fn test_from_option() {
        let none: CurveAccessor<Day> = Option::<f64>::None.into();
        assert!(none.is_absent());

        let some: CurveAccessor<Day> = Some(0.5).into();
        assert!(some.is_constant());
    }

    #[test]
    fn test_curve_missing_period() {
        let day = Day::from_ymd(2019, 8, 28).unwrap();
        let accessor: CurveAccessor<Day> = Curve::from_contiguous(day, &[1.0]).unwrap().into();
        assert!(matches!(
            accessor.value(&Day::from_ymd(2019, 8, 29).unwrap()),
            Err(CurveError::MissingPeriod { .. })
        ));
    }
}
