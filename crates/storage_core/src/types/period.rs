//! Time period abstraction used to index curves and step valuation lattices.
//!
//! A period is a discrete calendar unit at a fixed [`Frequency`]. Periods are
//! totally ordered and support integer offsetting, which is all the
//! valuation engines need to walk from a valuation date to a storage end.
//!
//! # Examples
//!
//! ```
//! use storage_core::types::{Day, TimePeriod, year_fraction};
//!
//! let start = Day::from_ymd(2019, 8, 28).unwrap();
//! let end = start.offset(28);
//! assert_eq!(end, Day::from_ymd(2019, 9, 25).unwrap());
//! assert_eq!(end.periods_since(&start), 28);
//! assert!((year_fraction(&start, &end) - 28.0 / 365.0).abs() < 1e-15);
//! ```

use chrono::NaiveDate;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use super::error::PeriodError;

/// Day count basis used for all year fractions (actual days / 365).
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Granularity of a [`TimePeriod`] implementation.
///
/// # Examples
///
/// ```
/// use storage_core::types::Frequency;
///
/// let freq: Frequency = "D".parse().unwrap();
/// assert_eq!(freq, Frequency::Daily);
/// assert_eq!(freq.periods_per_year(), 365);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Frequency {
    /// One period per calendar day.
    Daily,
    /// One period per calendar month.
    Monthly,
}

impl Frequency {
    /// Returns the nominal number of periods per year.
    #[inline]
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Daily => 365,
            Frequency::Monthly => 12,
        }
    }

    /// Returns the single-letter code of the frequency.
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Frequency::Daily => "D",
            Frequency::Monthly => "M",
        }
    }

    /// Returns the human-readable name of the frequency.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Monthly => "Monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Frequency {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D" | "DAILY" | "DAY" => Ok(Frequency::Daily),
            "M" | "MONTHLY" | "MONTH" => Ok(Frequency::Monthly),
            other => Err(PeriodError::ParseError(format!(
                "Unknown frequency: {}",
                other
            ))),
        }
    }
}

/// A discrete, totally ordered calendar period.
///
/// Implementations must guarantee that `offset` and `periods_since` are
/// inverse operations: `p.offset(n).periods_since(&p) == n`.
pub trait TimePeriod:
    Copy + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Frequency of this period type.
    fn frequency() -> Frequency;

    /// Returns the period `periods` steps after (or before, if negative) `self`.
    fn offset(&self, periods: i64) -> Self;

    /// Returns the signed number of periods from `earlier` to `self`.
    fn periods_since(&self, earlier: &Self) -> i64;

    /// Returns the first calendar day of the period.
    fn start_date(&self) -> NaiveDate;

    /// Returns the immediately following period.
    #[inline]
    fn next(&self) -> Self {
        self.offset(1)
    }

    /// Iterates over all periods from `self` to `last`, both inclusive.
    ///
    /// The iterator is empty when `last` precedes `self`.
    #[inline]
    fn range_inclusive(&self, last: &Self) -> PeriodRange<Self> {
        PeriodRange {
            next: *self,
            remaining: (last.periods_since(self) + 1).max(0) as usize,
        }
    }
}

/// Iterator over a contiguous run of periods.
#[derive(Debug, Clone)]
pub struct PeriodRange<P: TimePeriod> {
    next: P,
    remaining: usize,
}

impl<P: TimePeriod> Iterator for PeriodRange<P> {
    type Item = P;

    fn next(&mut self) -> Option<P> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.next = current.offset(1);
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<P: TimePeriod> ExactSizeIterator for PeriodRange<P> {}

/// Year fraction between the start dates of two periods (ACT/365).
///
/// Negative when `to` precedes `from`.
#[inline]
pub fn year_fraction<P: TimePeriod>(from: &P, to: &P) -> f64 {
    (to.start_date() - from.start_date()).num_days() as f64 / DAYS_PER_YEAR
}
