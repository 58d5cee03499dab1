//! Shared inputs and backward-induction machinery for storage valuation.
//!
//! Both the trinomial tree and the intrinsic valuation solve the same
//! dynamic programme over a (time x price node x inventory) state space.
//! They differ only in the price lattice: the tree branches three ways per
//! node, the intrinsic valuation follows the forward curve on a single node.
//!
//! - [`ValuationInputs`]: Storage, valuation date, inventory and market data
//! - [`SettlementRule`]: Delivery period to cash-settlement period mapping
//! - [`InventorySpace`]: Reachable and feasible inventory per period

mod induction;
mod inventory_space;
mod plan;

pub(crate) use induction::backward_induction;
pub use inventory_space::InventorySpace;
pub(crate) use plan::InductionPlan;

use std::fmt;
use std::sync::Arc;

use storage_core::market_data::{Curve, CurveAccessor};
use storage_core::types::{year_fraction, TimePeriod};
use storage_models::storage::StorageModel;

use crate::error::ValuationError;

/// Maps a delivery period to the period its commodity cash flow settles on.
///
/// Must be non-decreasing in its input.
///
/// # Examples
///
/// ```rust
/// use storage_core::types::{Day, TimePeriod};
/// use storage_pricing::valuation::SettlementRule;
///
/// let rule = SettlementRule::new(|day: &Day| day.offset(5));
/// let delivery = Day::from_ymd(2019, 9, 2).unwrap();
/// assert_eq!(rule.settle(&delivery), Day::from_ymd(2019, 9, 7).unwrap());
///
/// assert_eq!(SettlementRule::identity().settle(&delivery), delivery);
/// ```
#[derive(Clone)]
pub struct SettlementRule<P: TimePeriod>(Arc<dyn Fn(&P) -> P + Send + Sync>);

impl<P: TimePeriod> SettlementRule<P> {
    /// Wrap a settlement function.
    pub fn new<F>(rule: F) -> Self
    where
        F: Fn(&P) -> P + Send + Sync + 'static,
    {
        Self(Arc::new(rule))
    }

    /// Cash flows settle on the delivery period itself.
    pub fn identity() -> Self {
        Self::new(|period: &P| *period)
    }

    /// Settlement period for `delivery`.
    #[inline]
    pub fn settle(&self, delivery: &P) -> P {
        (self.0)(delivery)
    }
}

impl<P: TimePeriod> Default for SettlementRule<P> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<P: TimePeriod> fmt::Debug for SettlementRule<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SettlementRule(<fn>)")
    }
}

/// Everything a storage valuation needs besides the price dynamics.
///
/// `forward_curve` must cover every period from `val_date` to the storage
/// end; `interest_rates` must cover every settlement period of those
/// deliveries, and the delivery periods themselves (operating costs are
/// discounted from the period they are incurred in).
#[derive(Debug, Clone, Copy)]
pub struct ValuationInputs<'a, P: TimePeriod> {
    /// Facility being valued
    pub storage: &'a StorageModel<P>,
    /// Valuation (current) period
    pub val_date: P,
    /// Inventory held at the start of `val_date`
    pub inventory: f64,
    /// Forward price per delivery period
    pub forward_curve: &'a Curve<P>,
    /// Continuously compounded zero rates, ACT/365, by cash-flow period
    pub interest_rates: &'a CurveAccessor<P>,
    /// Delivery to settlement period mapping
    pub settlement_rule: &'a SettlementRule<P>,
}

impl<'a, P: TimePeriod> ValuationInputs<'a, P> {
    /// Bundle valuation inputs.
    pub fn new(
        storage: &'a StorageModel<P>,
        val_date: P,
        inventory: f64,
        forward_curve: &'a Curve<P>,
        interest_rates: &'a CurveAccessor<P>,
        settlement_rule: &'a SettlementRule<P>,
    ) -> Self {
        Self {
            storage,
            val_date,
            inventory,
            forward_curve,
            interest_rates,
            settlement_rule,
        }
    }

    /// Discount factor from `date` back to the valuation date. Cash flows on
    /// or before the valuation date are not discounted.
    pub fn discount_factor(&self, date: &P) -> Result<f64, ValuationError> {
        if *date <= self.val_date {
            return Ok(1.0);
        }
        let rate = self.interest_rates.value(date)?;
        Ok((-rate * year_fraction(&self.val_date, date)).exp())
    }

    /// Periods from the valuation date to the storage end, both inclusive.
    pub(crate) fn horizon(&self) -> Vec<P> {
        self.val_date.range_inclusive(&self.storage.end()).collect()
    }

    /// Forward price for every period in `periods`.
    pub(crate) fn forward_prices(&self, periods: &[P]) -> Result<Vec<f64>, ValuationError> {
        periods
            .iter()
            .map(|p| self.forward_curve.get(p).map_err(ValuationError::from))
            .collect()
    }
}
