//! Storage model error types.
//!
//! - [`StorageConfigError`]: Raised once, at construction, for inconsistent inputs
//! - [`StorageQueryError`]: Raised by per-date queries

use storage_core::market_data::CurveError;
use storage_core::types::InterpolationError;
use thiserror::Error;

/// Inconsistent or invalid storage construction inputs.
///
/// Each variant names the offending field so callers can fix the exact
/// input rather than guess which combination was rejected.
///
/// # Examples
///
/// ```
/// use storage_models::storage::StorageConfigError;
///
/// let err = StorageConfigError::UnexpectedWithRatchets { field: "min_inventory" };
/// assert_eq!(
///     err.to_string(),
///     "min_inventory parameter should not be provided if ratchets parameter is provided."
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageConfigError {
    /// A scalar/curve constraint was supplied together with ratchets.
    #[error("{field} parameter should not be provided if ratchets parameter is provided.")]
    UnexpectedWithRatchets {
        /// Name of the offending field
        field: &'static str,
    },

    /// A scalar/curve constraint is missing and no ratchets were supplied.
    #[error("{field} parameter should be provided if ratchets parameter is not provided.")]
    MissingWithoutRatchets {
        /// Name of the missing field
        field: &'static str,
    },

    /// `ratchet_interp` supplied without ratchets.
    #[error("ratchet_interp should not be provided if ratchets parameter is not provided.")]
    RatchetInterpWithoutRatchets,

    /// Ratchets supplied without `ratchet_interp`.
    #[error("ratchet_interp parameter should be provided if ratchets parameter is provided.")]
    RatchetsWithoutRatchetInterp,

    /// A required cost input was not supplied.
    #[error("{field} parameter must be provided.")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// Storage end does not come after storage start.
    #[error("Storage end {end} must be after storage start {start}")]
    EndNotAfterStart {
        /// Display form of the start period
        start: String,
        /// Display form of the end period
        end: String,
    },

    /// Ratchets supplied as an empty sequence.
    #[error("At least one ratchet must be provided")]
    EmptyRatchets,

    /// A ratchet has no pillars.
    #[error("Ratchet effective {date} has no inventory pillars")]
    EmptyPillars {
        /// Display form of the ratchet effective date
        date: String,
    },

    /// Ratchet effective dates are not strictly increasing.
    #[error("Ratchet effective dates must be strictly increasing: violation at index {index}")]
    NonIncreasingRatchetDates {
        /// Index of the first offending ratchet
        index: usize,
    },

    /// Pillar inventories within a ratchet are not strictly increasing.
    #[error("Ratchet effective {date}: pillar inventories must be strictly increasing at index {index}")]
    NonIncreasingPillarInventory {
        /// Display form of the ratchet effective date
        date: String,
        /// Index of the first offending pillar
        index: usize,
    },

    /// A pillar has a minimum rate above its maximum rate, or non-finite values.
    #[error("Ratchet effective {date}: invalid pillar rates [{min_rate}, {max_rate}] at inventory {inventory}")]
    InvalidPillarRates {
        /// Display form of the ratchet effective date
        date: String,
        /// Pillar inventory
        inventory: f64,
        /// Pillar minimum (withdrawal) rate
        min_rate: f64,
        /// Pillar maximum (injection) rate
        max_rate: f64,
    },

    /// Pillar interpolation tables could not be built.
    #[error("Ratchet interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),
}

/// Failures of per-date storage queries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageQueryError {
    /// Query date lies outside `[start, end]`.
    #[error("Date {date} outside storage range [{start}, {end}]")]
    DateOutOfRange {
        /// Display form of the queried date
        date: String,
        /// Display form of the storage start
        start: String,
        /// Display form of the storage end
        end: String,
    },

    /// Query date precedes the earliest ratchet.
    #[error("Date {date} precedes first ratchet effective {first}")]
    BeforeFirstRatchet {
        /// Display form of the queried date
        date: String,
        /// Display form of the earliest ratchet date
        first: String,
    },

    /// A curve input has no value for the queried date.
    #[error(transparent)]
    Curve(#[from] CurveError),

    /// Pillar interpolation failed.
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),
}
