//! Daily period backed by `chrono::NaiveDate`.

use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use super::error::PeriodError;
use super::period::{Frequency, TimePeriod};

/// A single calendar day.
///
/// Provides ISO 8601 parsing/formatting and day arithmetic.
///
/// # Examples
///
/// ```
/// use storage_core::types::{Day, TimePeriod};
///
/// let day = Day::from_ymd(2019, 8, 29).unwrap();
/// assert_eq!(day.year(), 2019);
/// assert_eq!(day.month(), 8);
/// assert_eq!(day.day(), 29);
///
/// let parsed: Day = "2019-08-29".parse().unwrap();
/// assert_eq!(day, parsed);
///
/// let later = Day::from_ymd(2019, 9, 10).unwrap();
/// assert_eq!(later - day, 12);
/// assert_eq!(day.offset(12), later);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Day(NaiveDate);

impl Day {
    /// Creates a day from year, month, and day components.
    ///
    /// # Errors
    ///
    /// Returns `PeriodError::InvalidDate` if the components do not form a
    /// valid calendar date.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, PeriodError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Day)
            .ok_or(PeriodError::InvalidDate { year, month, day })
    }

    /// Parses a day from an ISO 8601 string (YYYY-MM-DD).
    ///
    /// # Examples
    ///
    /// ```
    /// use storage_core::types::Day;
    ///
    /// assert!(Day::parse("2020-02-29").is_ok());
    /// assert!(Day::parse("2019-02-29").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PeriodError> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Day)
            .map_err(|e| PeriodError::ParseError(format!("{}: {}", s, e)))
    }

    /// Returns the underlying `NaiveDate`.
    #[inline]
    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    /// Returns the year component.
    #[inline]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    #[inline]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day-of-month component (1-31).
    #[inline]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Returns the day of year (1-366).
    #[inline]
    pub fn ordinal(&self) -> u32 {
        self.0.ordinal()
    }
}

impl From<NaiveDate> for Day {
    fn from(date: NaiveDate) -> Self {
        Day(date)
    }
}

impl TimePeriod for Day {
    #[inline]
    fn frequency() -> Frequency {
        Frequency::Daily
    }

    #[inline]
    fn offset(&self, periods: i64) -> Self {
        Day(self.0 + Duration::days(periods))
    }

    #[inline]
    fn periods_since(&self, earlier: &Self) -> i64 {
        (self.0 - earlier.0).num_days()
    }

    #[inline]
    fn start_date(&self) -> NaiveDate {
        self.0
    }
}

impl Sub for Day {
    type Output = i64;

    /// Returns the number of days between two days.
    fn sub(self, other: Self) -> i64 {
        self.periods_since(&other)
    }
}

impl FromStr for Day {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, PeriodError> {
        Day::parse(s)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
