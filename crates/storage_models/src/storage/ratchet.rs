//! Inventory-dependent injection/withdrawal envelopes ("ratchets").
//!
//! A [`Ratchet`] holds the envelope in force from its effective date until
//! the next ratchet takes over. Within a ratchet, rates are defined at
//! inventory pillars and interpolated between them with the configured
//! [`RatchetInterp`] mode. Inventory outside the pillar range clamps to the
//! boundary pillar. Rates are never interpolated across ratchet dates.
//!
//! # Examples
//!
//! ```
//! use storage_core::types::Day;
//! use storage_models::storage::{Ratchet, RatchetInterp, RatchetInterpolator, RatchetPillar};
//!
//! let d = |m, d| Day::from_ymd(2019, m, d).unwrap();
//! let ratchets = vec![
//!     Ratchet::new(d(8, 28), vec![
//!         RatchetPillar::new(0.0, -150.0, 255.2),
//!         RatchetPillar::new(2000.0, -200.0, 175.0),
//!     ]),
//!     Ratchet::new(d(9, 10), vec![
//!         RatchetPillar::new(0.0, -170.5, 235.8),
//!         RatchetPillar::new(700.0, -180.2, 200.77),
//!         RatchetPillar::new(1800.0, -190.5, 174.45),
//!     ]),
//! ];
//! let interp = RatchetInterpolator::new(ratchets, RatchetInterp::Linear).unwrap();
//!
//! let (min_rate, max_rate) = interp.inject_withdraw_range(&d(8, 29), 1000.0).unwrap();
//! assert!((min_rate + 175.0).abs() < 1e-10);
//! assert!((max_rate - 215.1).abs() < 1e-10);
//! ```

use storage_core::math::interpolators::{Interpolator, LinearInterpolator, StepInterpolator};
use storage_core::types::{InterpolationError, TimePeriod};

use super::error::{StorageConfigError, StorageQueryError};

/// One inventory level of a ratchet with its permitted rate band.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatchetPillar {
    /// Inventory level of the pillar
    pub inventory: f64,
    /// Minimum net rate (withdrawal, usually non-positive)
    pub min_rate: f64,
    /// Maximum net rate (injection, usually non-negative)
    pub max_rate: f64,
}

impl RatchetPillar {
    /// Create a pillar.
    #[inline]
    pub fn new(inventory: f64, min_rate: f64, max_rate: f64) -> Self {
        Self {
            inventory,
            min_rate,
            max_rate,
        }
    }
}

impl From<(f64, f64, f64)> for RatchetPillar {
    fn from((inventory, min_rate, max_rate): (f64, f64, f64)) -> Self {
        Self::new(inventory, min_rate, max_rate)
    }
}

/// Envelope of pillars effective from a date.
#[derive(Debug, Clone, PartialEq)]
pub struct Ratchet<P: TimePeriod> {
    /// First period the envelope applies to
    pub effective_date: P,
    /// Pillars ordered by strictly increasing inventory
    pub pillars: Vec<RatchetPillar>,
}

impl<P: TimePeriod> Ratchet<P> {
    /// Create a ratchet; validation happens in [`RatchetInterpolator::new`].
    pub fn new(effective_date: P, pillars: Vec<RatchetPillar>) -> Self {
        Self {
            effective_date,
            pillars,
        }
    }

    /// Inventory of the first pillar.
    #[inline]
    pub fn min_inventory(&self) -> f64 {
        self.pillars.first().map_or(f64::NAN, |p| p.inventory)
    }

    /// Inventory of the last pillar.
    #[inline]
    pub fn max_inventory(&self) -> f64 {
        self.pillars.last().map_or(f64::NAN, |p| p.inventory)
    }
}

/// Interpolation of pillar rates across inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RatchetInterp {
    /// Rate of the nearest pillar at or below the inventory.
    Step,
    /// Piecewise linear between bracketing pillars.
    Linear,
}

/// Interpolation table for one rate bound of one ratchet.
#[derive(Debug, Clone)]
enum RateCurve {
    Linear(LinearInterpolator<f64>),
    Step(StepInterpolator<f64>),
}

impl RateCurve {
    fn build(
        inventories: &[f64],
        rates: &[f64],
        mode: RatchetInterp,
    ) -> Result<Self, InterpolationError> {
        // A single pillar is constant in either mode
        if mode == RatchetInterp::Step || inventories.len() == 1 {
            StepInterpolator::new(inventories, rates).map(RateCurve::Step)
        } else {
            LinearInterpolator::new(inventories, rates).map(RateCurve::Linear)
        }
    }

    #[inline]
    fn rate(&self, inventory: f64) -> Result<f64, InterpolationError> {
        match self {
            RateCurve::Linear(interp) => interp.interpolate_flat(inventory),
            RateCurve::Step(interp) => interp.interpolate_flat(inventory),
        }
    }
}

#[derive(Debug, Clone)]
struct RatchetTable {
    min_rates: RateCurve,
    max_rates: RateCurve,
}

/// Resolves the active ratchet for a date and interpolates its rates.
#[derive(Debug, Clone)]
pub struct RatchetInterpolator<P: TimePeriod> {
    ratchets: Vec<Ratchet<P>>,
    tables: Vec<RatchetTable>,
    mode: RatchetInterp,
}

impl<P: TimePeriod> RatchetInterpolator<P> {
    /// Validate ratchets and build interpolation tables.
    ///
    /// # Errors
    ///
    /// - `EmptyRatchets` if `ratchets` is empty
    /// - `NonIncreasingRatchetDates` if effective dates are not strictly increasing
    /// - `EmptyPillars` if a ratchet has no pillars
    /// - `NonIncreasingPillarInventory` if pillar inventories are not strictly increasing
    /// - `InvalidPillarRates` if a pillar's minimum rate exceeds its maximum rate
    pub fn new(ratchets: Vec<Ratchet<P>>, mode: RatchetInterp) -> Result<Self, StorageConfigError> {
        if ratchets.is_empty() {
            return Err(StorageConfigError::EmptyRatchets);
        }
        for (index, window) in ratchets.windows(2).enumerate() {
            if window[1].effective_date <= window[0].effective_date {
                return Err(StorageConfigError::NonIncreasingRatchetDates { index: index + 1 });
            }
        }

        let mut tables = Vec::with_capacity(ratchets.len());
        for ratchet in &ratchets {
            let date = ratchet.effective_date.to_string();
            if ratchet.pillars.is_empty() {
                return Err(StorageConfigError::EmptyPillars { date });
            }
            for (index, window) in ratchet.pillars.windows(2).enumerate() {
                if window[1].inventory <= window[0].inventory {
                    return Err(StorageConfigError::NonIncreasingPillarInventory {
                        date,
                        index: index + 1,
                    });
                }
            }
            if let Some(pillar) = ratchet.pillars.iter().find(|p| {
                !(p.inventory.is_finite() && p.min_rate.is_finite() && p.max_rate.is_finite())
                    || p.min_rate > p.max_rate
            }) {
                return Err(StorageConfigError::InvalidPillarRates {
                    date,
                    inventory: pillar.inventory,
                    min_rate: pillar.min_rate,
                    max_rate: pillar.max_rate,
                });
            }

            let inventories: Vec<f64> = ratchet.pillars.iter().map(|p| p.inventory).collect();
            let min_rates: Vec<f64> = ratchet.pillars.iter().map(|p| p.min_rate).collect();
            let max_rates: Vec<f64> = ratchet.pillars.iter().map(|p| p.max_rate).collect();
            tables.push(RatchetTable {
                min_rates: RateCurve::build(&inventories, &min_rates, mode)?,
                max_rates: RateCurve::build(&inventories, &max_rates, mode)?,
            });
        }

        Ok(Self {
            ratchets,
            tables,
            mode,
        })
    }

    /// Returns the interpolation mode.
    #[inline]
    pub fn mode(&self) -> RatchetInterp {
        self.mode
    }

    /// Returns the validated ratchets in date order.
    #[inline]
    pub fn ratchets(&self) -> &[Ratchet<P>] {
        &self.ratchets
    }

    /// Index of the ratchet with the greatest effective date at or before `date`.
    fn active_index(&self, date: &P) -> Result<usize, StorageQueryError> {
        let pos = self.ratchets.partition_point(|r| r.effective_date <= *date);
        if pos == 0 {
            return Err(StorageQueryError::BeforeFirstRatchet {
                date: date.to_string(),
                first: self.ratchets[0].effective_date.to_string(),
            });
        }
        Ok(pos - 1)
    }

    /// Returns the ratchet in force on `date`.
    pub fn active_ratchet(&self, date: &P) -> Result<&Ratchet<P>, StorageQueryError> {
        self.active_index(date).map(|idx| &self.ratchets[idx])
    }

    /// Returns `(min_rate, max_rate)` at `inventory` on `date`.
    pub fn inject_withdraw_range(
        &self,
        date: &P,
        inventory: f64,
    ) -> Result<(f64, f64), StorageQueryError> {
        let table = &self.tables[self.active_index(date)?];
        Ok((
            table.min_rates.rate(inventory)?,
            table.max_rates.rate(inventory)?,
        ))
    }

    /// Returns the first pillar inventory of the ratchet in force on `date`.
    pub fn min_inventory(&self, date: &P) -> Result<f64, StorageQueryError> {
        self.active_ratchet(date).map(Ratchet::min_inventory)
    }

    /// Returns the last pillar inventory of the ratchet in force on `date`.
    pub fn max_inventory(&self, date: &P) -> Result<f64, StorageQueryError> {
        self.active_ratchet(date).map(Ratchet::max_inventory)
    }
}
