//! Error types for the valuation and simulation engines.
//!
//! - [`ValuationError`]: Tree and intrinsic valuation failures
//! - [`SimulationError`]: Spot simulation failures
//! - [`ExportError`]: Simulation result export failures
//!
//! All failures are deterministic given their inputs; none are retried.

use storage_core::market_data::CurveError;
use storage_core::types::SolverError;
use storage_models::models::{CorrelationError, ModelError};
use storage_models::storage::StorageQueryError;
use thiserror::Error;

use crate::config::ConfigError;

/// Failures of tree or intrinsic storage valuation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValuationError {
    /// Valuation date is not before storage end.
    #[error("Valuation date {val_date} must be before storage end {end}")]
    ValuationDateNotBeforeEnd {
        /// Display form of the valuation date
        val_date: String,
        /// Display form of the storage end
        end: String,
    },

    /// Volatility that would collapse the lattice branches.
    #[error("Spot volatility for {period} must be positive and finite: got {value}")]
    InvalidVolatility {
        /// Display form of the period
        period: String,
        /// Supplied value
        value: f64,
    },

    /// Mean reversion outside `[0, inf)`.
    #[error("Mean reversion must be finite and non-negative: got {0}")]
    InvalidMeanReversion(f64),

    /// Forward price that cannot anchor a log-price lattice.
    #[error("Forward price for {period} must be positive and finite: got {value}")]
    InvalidForwardPrice {
        /// Display form of the period
        period: String,
        /// Supplied value
        value: f64,
    },

    /// Starting inventory cannot be reached or cannot reach storage end feasibly.
    #[error("Inventory {inventory} infeasible on {period}: permitted range [{min}, {max}]")]
    InfeasibleInventory {
        /// Display form of the period
        period: String,
        /// Offending inventory
        inventory: f64,
        /// Lowest feasible inventory
        min: f64,
        /// Highest feasible inventory
        max: f64,
    },

    /// Invalid engine settings.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage query failure (date out of range, missing curve point).
    #[error("Storage error: {0}")]
    Storage(#[from] StorageQueryError),

    /// Market curve lookup failure.
    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),

    /// Root finding failure in the inventory-space calculation.
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    /// Cancelled through the cancellation token.
    #[error("Valuation cancelled")]
    Cancelled,
}

/// Failures of multi-factor spot simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A requested delivery period precedes the current date.
    #[error("Simulated period {period} precedes current date {current_date}")]
    PeriodBeforeCurrentDate {
        /// Display form of the period
        period: String,
        /// Display form of the current date
        current_date: String,
    },

    /// Forward price that cannot anchor a log-normal spot price.
    #[error("Forward price for {period} must be positive and finite: got {value}")]
    InvalidForwardPrice {
        /// Display form of the period
        period: String,
        /// Supplied value
        value: f64,
    },

    /// Invalid factor model.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Factor covariance could not be factorised.
    #[error("Correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    /// Missing forward price or factor volatility.
    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),

    /// Invalid simulation settings.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cancelled through the cancellation token.
    #[error("Simulation cancelled")]
    Cancelled,
}

/// Failures writing simulation results.
#[derive(Error, Debug)]
pub enum ExportError {
    /// CSV serialisation failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
