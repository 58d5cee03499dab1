//! Market data containers for storage valuation.
//!
//! Forward curves, volatility curves, interest rates and every cost input are
//! period-indexed [`Curve`]s, optionally wrapped in a [`CurveAccessor`] when a
//! scalar constant is also acceptable.
//!
//! # Example
//!
//! ```
//! use storage_core::market_data::{Curve, CurveAccessor};
//! use storage_core::types::Day;
//!
//! let start = Day::from_ymd(2019, 9, 2).unwrap();
//! let end = Day::from_ymd(2019, 9, 25).unwrap();
//! let rates = Curve::constant(start, end, 0.03).unwrap();
//! let accessor = CurveAccessor::from(rates);
//! assert_eq!(accessor.value(&end).unwrap(), 0.03);
//! ```

pub mod curves;
pub mod error;

pub use curves::{Curve, CurveAccessor};
pub use error::CurveError;
