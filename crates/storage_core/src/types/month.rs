//! Monthly period.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

use super::error::PeriodError;
use super::period::{Frequency, TimePeriod};

/// A calendar month, stored as a count of months since January of year 0.
///
/// # Examples
///
/// ```
/// use storage_core::types::{Month, TimePeriod};
///
/// let dec = Month::new(2019, 12).unwrap();
/// let jan = dec.next();
/// assert_eq!(jan, Month::new(2020, 1).unwrap());
/// assert_eq!(jan.to_string(), "2020-01");
/// assert_eq!("2020-01".parse::<Month>().unwrap(), jan);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Month {
    index: i64,
}

impl Month {
    /// Creates a month from year and month (1-12) components.
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(PeriodError::InvalidDate {
                year,
                month,
                day: 1,
            });
        }
        Ok(Self {
            index: year as i64 * 12 + (month as i64 - 1),
        })
    }

    /// Returns the month containing the given day.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            index: date.year() as i64 * 12 + (date.month() as i64 - 1),
        }
    }

    /// Returns the year component.
    #[inline]
    pub fn year(&self) -> i32 {
        self.index.div_euclid(12) as i32
    }

    /// Returns the month component (1-12).
    #[inline]
    pub fn month(&self) -> u32 {
        self.index.rem_euclid(12) as u32 + 1
    }

    /// Parses a month from a `YYYY-MM` string.
    pub fn parse(s: &str) -> Result<Self, PeriodError> {
        let trimmed = s.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| PeriodError::ParseError(format!("{}: expected YYYY-MM", s)))?;
        let year: i32 = year
            .parse()
            .map_err(|_| PeriodError::ParseError(format!("{}: invalid year", s)))?;
        let month: u32 = month
            .parse()
            .map_err(|_| PeriodError::ParseError(format!("{}: invalid month", s)))?;
        Month::new(year, month)
    }
}

impl TimePeriod for Month {
    #[inline]
    fn frequency() -> Frequency {
        Frequency::Monthly
    }

    #[inline]
    fn offset(&self, periods: i64) -> Self {
        Self {
            index: self.index + periods,
        }
    }

    #[inline]
    fn periods_since(&self, earlier: &Self) -> i64 {
        self.index - earlier.index
    }

    fn start_date(&self) -> NaiveDate {
        // Saturates for months beyond chrono's representable range.
        NaiveDate::from_ymd_opt(self.year(), self.month(), 1).unwrap_or(NaiveDate::MAX)
    }
}

impl FromStr for Month {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, PeriodError> {
        Month::parse(s)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}
