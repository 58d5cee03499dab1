//! # storage_core: Foundation Types for Commodity Storage Valuation
//!
//! ## Layer 1 (Foundation) Role
//!
//! storage_core is the bottom layer of the workspace, providing:
//! - Time periods: [`types::TimePeriod`], [`types::Day`], [`types::Month`], [`types::Frequency`]
//! - Period-indexed curves: [`market_data::Curve`], [`market_data::CurveAccessor`]
//! - Interpolation and root finding (`math`)
//! - Error types: `PeriodError`, `CurveError`, `InterpolationError`, `SolverError`
//!
//! Layer 1 has no dependencies on other storage_* crates.
//!
//! ## Usage Examples
//!
//! ```rust
//! use storage_core::market_data::{Curve, CurveAccessor};
//! use storage_core::types::{Day, TimePeriod};
//!
//! let start = Day::from_ymd(2019, 8, 28).unwrap();
//! let end = start.offset(28);
//!
//! let injection_cost: CurveAccessor<Day> = 0.015.into();
//! let forward = Curve::constant(start, end, 58.89).unwrap();
//!
//! assert_eq!(injection_cost.value(&end).unwrap(), 0.015);
//! assert_eq!(forward.get(&end).unwrap(), 58.89);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for periods, frequency and error types

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod types;
