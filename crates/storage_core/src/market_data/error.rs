//! Market data error types.

use thiserror::Error;

/// Errors raised when constructing or querying time-indexed curves.
///
/// # Examples
///
/// ```
/// use storage_core::market_data::CurveError;
///
/// let err = CurveError::MissingPeriod { period: "2019-09-01".to_string() };
/// assert_eq!(format!("{}", err), "No curve value for period 2019-09-01");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CurveError {
    /// Curve constructed without any points.
    #[error("Curve must contain at least one point")]
    Empty,

    /// Periods are not strictly increasing.
    #[error("Curve periods must be strictly increasing: violation at index {index}")]
    NonIncreasingPeriods {
        /// Index of the first offending point
        index: usize,
    },

    /// Query for a period the curve has no entry for.
    #[error("No curve value for period {period}")]
    MissingPeriod {
        /// Display form of the requested period
        period: String,
    },

    /// Non-finite value supplied for a period.
    #[error("Non-finite curve value {value} at period {period}")]
    NonFiniteValue {
        /// Display form of the offending period
        period: String,
        /// The offending value
        value: f64,
    },

    /// Invalid construction arguments.
    #[error("Invalid curve input: {0}")]
    InvalidInput(String),
}
