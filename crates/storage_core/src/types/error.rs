//! Error types for structured error handling.
//!
//! This module provides:
//! - `PeriodError`: Errors from period construction and parsing
//! - `InterpolationError`: Errors from interpolation operations
//! - `SolverError`: Errors from root-finding solvers

use std::fmt;
use thiserror::Error;

/// Period-related errors.
///
/// Provides structured error handling for day and month construction
/// and parsing with descriptive context for each failure mode.
///
/// # Variants
/// - `InvalidDate`: Invalid date components (e.g., February 30th)
/// - `ParseError`: Failed to parse a period string
///
/// # Examples
/// ```
/// use storage_core::types::PeriodError;
///
/// let err = PeriodError::InvalidDate { year: 2019, month: 2, day: 30 };
/// assert_eq!(format!("{}", err), "Invalid date: 2019-2-30");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    /// Invalid date components (e.g., February 30th).
    InvalidDate {
        /// Year component
        year: i32,
        /// Month component (1-12)
        month: u32,
        /// Day component (1-31)
        day: u32,
    },

    /// Failed to parse period string.
    ParseError(String),
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodError::InvalidDate { year, month, day } => {
                write!(f, "Invalid date: {}-{}-{}", year, month, day)
            }
            PeriodError::ParseError(msg) => write!(f, "Period parse error: {}", msg),
        }
    }
}

impl std::error::Error for PeriodError {}

/// Interpolation errors.
///
/// # Examples
/// ```
/// use storage_core::types::InterpolationError;
///
/// let err = InterpolationError::OutOfBounds { x: 5.0, min: 0.0, max: 3.0 };
/// assert!(format!("{}", err).contains("outside valid domain"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterpolationError {
    /// Query point outside valid interpolation domain.
    #[error("Query point {x} outside valid domain [{min}, {max}]")]
    OutOfBounds {
        /// The query point that was out of bounds
        x: f64,
        /// Minimum valid value
        min: f64,
        /// Maximum valid value
        max: f64,
    },

    /// Insufficient data points for interpolation.
    #[error("Insufficient data points: got {got}, need at least {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// Abscissae are not strictly increasing.
    #[error("Data is not strictly increasing at index {index}")]
    NonMonotonicData {
        /// Index where the violation was detected
        index: usize,
    },

    /// Invalid input data or parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Root-finding solver errors.
///
/// # Examples
/// ```
/// use storage_core::types::SolverError;
///
/// let err = SolverError::MaxIterationsExceeded { iterations: 100 };
/// assert!(format!("{}", err).contains("100 iterations"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverError {
    /// Solver failed to converge within maximum iterations.
    #[error("Failed to converge after {iterations} iterations")]
    MaxIterationsExceeded {
        /// Number of iterations attempted
        iterations: usize,
    },

    /// No valid bracket (function values at endpoints have same sign).
    #[error("No bracket: f({a}) and f({b}) have same sign")]
    NoBracket {
        /// Left bracket endpoint
        a: f64,
        /// Right bracket endpoint
        b: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_error_display() {
        let err = PeriodError::ParseError("bad".to_string());
        assert_eq!(format!("{}", err), "Period parse error: bad");
    }

    #[test]
    fn test_interpolation_error_display() {
        let err = InterpolationError::InsufficientData { got: 1, need: 2 };
        assert_eq!(
            format!("{}", err),
            "Insufficient data points: got 1, need at least 2"
        );

        let err = InterpolationError::NonMonotonicData { index: 3 };
        assert!(format!("{}", err).contains("index 3"));
    }

    #[test]
    fn test_solver_error_display() {
        let err = SolverError::NoBracket { a: 1.0, b: 2.0 };
        assert!(format!("{}", err).contains("same sign"));
    }
}
