//! Immutable storage facility model.

use storage_core::market_data::CurveAccessor;
use storage_core::types::{Frequency, TimePeriod};

use super::builder::StorageModelBuilder;
use super::error::StorageQueryError;
use super::ratchet::{Ratchet, RatchetInterp, RatchetInterpolator};
use super::terminal::TerminalStorageNpv;

/// Operating envelope of a facility: either a ratchet table or four
/// independent scalar/curve inputs. The discriminant is fixed at
/// construction so queries never re-check which inputs are present.
#[derive(Debug, Clone)]
pub enum StorageConstraints<P: TimePeriod> {
    /// Inventory-dependent envelope from dated ratchets.
    Ratchets(RatchetInterpolator<P>),
    /// Inventory-independent envelope.
    Scalar {
        /// Minimum inventory per date
        min_inventory: CurveAccessor<P>,
        /// Maximum inventory per date
        max_inventory: CurveAccessor<P>,
        /// Maximum injection rate per date
        max_injection_rate: CurveAccessor<P>,
        /// Maximum withdrawal rate per date (positive magnitude)
        max_withdrawal_rate: CurveAccessor<P>,
    },
}

/// Commodity storage facility.
///
/// Constructed once through [`StorageModel::builder`] and read-only
/// thereafter. All queries are pure functions of `(date, inventory)`.
/// Dates are valid in `[start, end]`; `end` is the terminal, valuation-only
/// date.
///
/// # Examples
///
/// ```
/// use storage_core::types::Day;
/// use storage_models::storage::StorageModel;
///
/// let start = Day::from_ymd(2019, 12, 1).unwrap();
/// let end = Day::from_ymd(2020, 4, 1).unwrap();
///
/// let storage = StorageModel::builder(start, end)
///     .injection_cost(1.23)
///     .withdrawal_cost(0.98)
///     .min_inventory(0.0)
///     .max_inventory(100_000.0)
///     .max_injection_rate(700.0)
///     .max_withdrawal_rate(700.0)
///     .build()
///     .unwrap();
///
/// assert_eq!(storage.inject_withdraw_range(&start, 500.0).unwrap(), (-700.0, 700.0));
/// assert_eq!(storage.injection_cost(&start, 500.0, 100.0).unwrap(), 123.0);
/// assert!(storage.empty_at_end());
/// ```
#[derive(Debug, Clone)]
pub struct StorageModel<P: TimePeriod> {
    pub(crate) start: P,
    pub(crate) end: P,
    pub(crate) constraints: StorageConstraints<P>,
    pub(crate) injection_cost: CurveAccessor<P>,
    pub(crate) withdrawal_cost: CurveAccessor<P>,
    pub(crate) cmdty_consumed_inject: CurveAccessor<P>,
    pub(crate) cmdty_consumed_withdraw: CurveAccessor<P>,
    pub(crate) inventory_loss: CurveAccessor<P>,
    pub(crate) inventory_cost: CurveAccessor<P>,
    pub(crate) terminal_storage_npv: Option<TerminalStorageNpv>,
}

impl<P: TimePeriod> StorageModel<P> {
    /// Start a builder for a facility operable over `[start, end)`.
    #[inline]
    pub fn builder(start: P, end: P) -> StorageModelBuilder<P> {
        StorageModelBuilder::new(start, end)
    }

    /// First operable period.
    #[inline]
    pub fn start(&self) -> P {
        self.start
    }

    /// Terminal period (no decisions are taken on it).
    #[inline]
    pub fn end(&self) -> P {
        self.end
    }

    /// Frequency of the period type.
    #[inline]
    pub fn frequency(&self) -> Frequency {
        P::frequency()
    }

    /// Constraint representation in use.
    #[inline]
    pub fn constraints(&self) -> &StorageConstraints<P> {
        &self.constraints
    }

    /// Ratchets, if the facility was configured with them.
    pub fn ratchets(&self) -> Option<&[Ratchet<P>]> {
        match &self.constraints {
            StorageConstraints::Ratchets(interp) => Some(interp.ratchets()),
            StorageConstraints::Scalar { .. } => None,
        }
    }

    /// Ratchet interpolation mode, if configured with ratchets.
    pub fn ratchet_interp(&self) -> Option<RatchetInterp> {
        match &self.constraints {
            StorageConstraints::Ratchets(interp) => Some(interp.mode()),
            StorageConstraints::Scalar { .. } => None,
        }
    }

    /// True when no terminal value function was supplied.
    #[inline]
    pub fn empty_at_end(&self) -> bool {
        self.terminal_storage_npv.is_none()
    }

    #[inline]
    fn check_date(&self, date: &P) -> Result<(), StorageQueryError> {
        if *date < self.start || *date > self.end {
            return Err(StorageQueryError::DateOutOfRange {
                date: date.to_string(),
                start: self.start.to_string(),
                end: self.end.to_string(),
            });
        }
        Ok(())
    }

    /// Returns `(min_rate, max_rate)` of the net injection (+) / withdrawal (-)
    /// volume permitted on `date` at `inventory`.
    pub fn inject_withdraw_range(
        &self,
        date: &P,
        inventory: f64,
    ) -> Result<(f64, f64), StorageQueryError> {
        self.check_date(date)?;
        match &self.constraints {
            StorageConstraints::Ratchets(interp) => interp.inject_withdraw_range(date, inventory),
            StorageConstraints::Scalar {
                max_injection_rate,
                max_withdrawal_rate,
                ..
            } => Ok((
                -max_withdrawal_rate.value(date)?,
                max_injection_rate.value(date)?,
            )),
        }
    }

    /// Minimum inventory on `date`.
    pub fn min_inventory(&self, date: &P) -> Result<f64, StorageQueryError> {
        self.check_date(date)?;
        match &self.constraints {
            StorageConstraints::Ratchets(interp) => interp.min_inventory(date),
            StorageConstraints::Scalar { min_inventory, .. } => Ok(min_inventory.value(date)?),
        }
    }

    /// Maximum inventory on `date`.
    pub fn max_inventory(&self, date: &P) -> Result<f64, StorageQueryError> {
        self.check_date(date)?;
        match &self.constraints {
            StorageConstraints::Ratchets(interp) => interp.max_inventory(date),
            StorageConstraints::Scalar { max_inventory, .. } => Ok(max_inventory.value(date)?),
        }
    }

    /// Cost of injecting `volume` on `date`. `inventory` is accepted for
    /// inventory-dependent cost curves and currently unused.
    pub fn injection_cost(
        &self,
        date: &P,
        _inventory: f64,
        volume: f64,
    ) -> Result<f64, StorageQueryError> {
        self.check_date(date)?;
        Ok(self.injection_cost.value(date)? * volume)
    }

    /// Cost of withdrawing `volume` (positive magnitude) on `date`.
    pub fn withdrawal_cost(
        &self,
        date: &P,
        _inventory: f64,
        volume: f64,
    ) -> Result<f64, StorageQueryError> {
        self.check_date(date)?;
        Ok(self.withdrawal_cost.value(date)? * volume)
    }

    /// Commodity consumed when injecting `volume` on `date`.
    pub fn cmdty_consumed_inject(
        &self,
        date: &P,
        _inventory: f64,
        volume: f64,
    ) -> Result<f64, StorageQueryError> {
        self.check_date(date)?;
        Ok(self.cmdty_consumed_inject.value(date)? * volume)
    }

    /// Commodity consumed when withdrawing `volume` (positive magnitude) on `date`.
    pub fn cmdty_consumed_withdraw(
        &self,
        date: &P,
        _inventory: f64,
        volume: f64,
    ) -> Result<f64, StorageQueryError> {
        self.check_date(date)?;
        Ok(self.cmdty_consumed_withdraw.value(date)? * volume)
    }

    /// Fraction of inventory lost over the period starting `date`.
    pub fn inventory_pcnt_loss(&self, date: &P) -> Result<f64, StorageQueryError> {
        self.check_date(date)?;
        Ok(self.inventory_loss.value(date)?)
    }

    /// Holding cost of `inventory` over the period starting `date`.
    pub fn inventory_cost(&self, date: &P, inventory: f64) -> Result<f64, StorageQueryError> {
        self.check_date(date)?;
        Ok(self.inventory_cost.value(date)? * inventory)
    }

    /// Value credited at storage end for `inventory` at terminal spot `price`.
    /// Zero when no terminal function was supplied.
    #[inline]
    pub fn terminal_storage_npv(&self, price: f64, inventory: f64) -> f64 {
        self.terminal_storage_npv
            .as_ref()
            .map_or(0.0, |npv| npv.evaluate(price, inventory))
    }
}
