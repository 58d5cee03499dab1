//! Per-period operating profile from an intrinsic valuation.

use serde::{Deserialize, Serialize};
use storage_core::types::TimePeriod;

/// Optimal operation on one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry<P: TimePeriod> {
    /// Delivery period
    pub period: P,
    /// Inventory after the period's decision and loss
    pub inventory: f64,
    /// Net injection (+) / withdrawal (-)
    pub inject_withdraw: f64,
    /// Commodity consumed by the decision
    pub cmdty_consumed: f64,
    /// Inventory lost over the period
    pub inventory_loss: f64,
    /// Discounted commodity position, the delta to this period's forward
    pub net_position: f64,
    /// Discounted cash flow of the period
    pub period_pv: f64,
}

/// Time-ordered sequence of [`ProfileEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageProfile<P: TimePeriod> {
    entries: Vec<ProfileEntry<P>>,
}

impl<P: TimePeriod> Default for StorageProfile<P> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<P: TimePeriod> StorageProfile<P> {
    /// Wrap entries on consecutive periods.
    pub fn new(entries: Vec<ProfileEntry<P>>) -> Self {
        Self { entries }
    }

    /// Number of periods covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no periods are covered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in period order.
    #[inline]
    pub fn entries(&self) -> &[ProfileEntry<P>] {
        &self.entries
    }

    /// Iterate entries in period order.
    pub fn iter(&self) -> impl Iterator<Item = &ProfileEntry<P>> {
        self.entries.iter()
    }

    /// Entry for `period`, if covered.
    pub fn get(&self, period: &P) -> Option<&ProfileEntry<P>> {
        let first = self.entries.first()?;
        let index = usize::try_from(period.periods_since(&first.period)).ok()?;
        self.entries.get(index)
    }

    /// Sum of period PVs.
    pub fn total_pv(&self) -> f64 {
        self.entries.iter().map(|e| e.period_pv).sum()
    }
}
