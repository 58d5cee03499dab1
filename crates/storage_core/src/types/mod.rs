//! Core time and error types.
//!
//! This module provides:
//! - `period`: The [`TimePeriod`] trait, [`Frequency`] and ACT/365 year fractions
//! - `day`, `month`: Concrete period types
//! - `error`: Structured error types for period, interpolation and solver operations
//!
//! # Re-exports
//!
//! - [`Day`], [`Month`], [`TimePeriod`], [`PeriodRange`], [`Frequency`], [`year_fraction`]
//! - [`PeriodError`], [`InterpolationError`], [`SolverError`]

mod day;
pub mod error;
mod month;
pub mod period;

pub use day::Day;
pub use error::{InterpolationError, PeriodError, SolverError};
pub use month::Month;
pub use period::{year_fraction, Frequency, PeriodRange, TimePeriod, DAYS_PER_YEAR};
