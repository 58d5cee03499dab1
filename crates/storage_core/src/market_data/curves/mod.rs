//! Time-indexed curves.
//!
//! This module provides:
//! - [`Curve`]: Ordered period-to-value mapping with exact lookups
//! - [`CurveAccessor`]: Scalar / curve / absent input abstraction

mod accessor;
mod curve;

pub use accessor::CurveAccessor;
pub use curve::Curve;
