//! Feasible inventory range per period.
//!
//! The range on each period is the intersection of what can be reached from
//! the starting inventory by injecting or withdrawing at full rate, and what
//! can still reach the permitted inventory at storage end. Where rates depend
//! on inventory the backward boundary is found with a Brent root solve.

use storage_core::math::solvers::{BrentSolver, SolverConfig, DEFAULT_MAX_ITERATIONS};
use storage_core::types::TimePeriod;
use storage_models::storage::StorageModel;

use crate::error::ValuationError;

/// Reachable and feasible inventory bounds from the valuation date to the
/// storage end.
///
/// # Examples
///
/// ```rust
/// use storage_core::types::Day;
/// use storage_models::storage::StorageModel;
/// use storage_pricing::valuation::InventorySpace;
///
/// let start = Day::from_ymd(2019, 9, 1).unwrap();
/// let end = Day::from_ymd(2019, 9, 4).unwrap();
/// let storage = StorageModel::builder(start, end)
///     .injection_cost(0.0)
///     .withdrawal_cost(0.0)
///     .min_inventory(0.0)
///     .max_inventory(100.0)
///     .max_injection_rate(10.0)
///     .max_withdrawal_rate(5.0)
///     .build()
///     .unwrap();
///
/// let space = InventorySpace::compute(&storage, start, 20.0, 1e-10).unwrap();
/// assert_eq!(space.bounds(&end), Some((5.0, 50.0)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySpace<P: TimePeriod> {
    periods: Vec<P>,
    bounds: Vec<(f64, f64)>,
}

impl<P: TimePeriod> InventorySpace<P> {
    /// Compute the inventory space for `inventory` held on `val_date`.
    ///
    /// # Errors
    ///
    /// - `ValuationDateNotBeforeEnd` if `val_date` is not before the storage end
    /// - `InfeasibleInventory` if `inventory` cannot reach the permitted
    ///   range at storage end, or some period admits no inventory at all
    /// - `Storage` / `Solver` on query or root-finding failures
    pub fn compute(
        storage: &StorageModel<P>,
        val_date: P,
        inventory: f64,
        tolerance: f64,
    ) -> Result<Self, ValuationError> {
        let end = storage.end();
        if val_date >= end {
            return Err(ValuationError::ValuationDateNotBeforeEnd {
                val_date: val_date.to_string(),
                end: end.to_string(),
            });
        }
        let periods: Vec<P> = val_date.range_inclusive(&end).collect();
        let num_levels = periods.len();
        let solver = BrentSolver::new(SolverConfig::new(tolerance, DEFAULT_MAX_ITERATIONS));
        let active = |period: &P| *period >= storage.start();

        let mut feasible = vec![(0.0, 0.0); num_levels];
        feasible[num_levels - 1] = (storage.min_inventory(&end)?, storage.max_inventory(&end)?);
        for level in (0..num_levels - 1).rev() {
            let period = &periods[level];
            feasible[level] = if active(period) {
                backward_bounds(storage, period, feasible[level + 1], &solver)?
            } else {
                feasible[level + 1]
            };
        }

        let (lowest, highest) = feasible[0];
        if inventory < lowest - tolerance || inventory > highest + tolerance {
            return Err(ValuationError::InfeasibleInventory {
                period: val_date.to_string(),
                inventory,
                min: lowest,
                max: highest,
            });
        }

        let mut bounds = Vec::with_capacity(num_levels);
        bounds.push((inventory, inventory));
        for level in 0..num_levels - 1 {
            let period = &periods[level];
            let (lo, hi) = bounds[level];
            let (reach_lo, reach_hi) = if active(period) {
                let retained = 1.0 - storage.inventory_pcnt_loss(period)?;
                let (min_rate, _) = storage.inject_withdraw_range(period, lo)?;
                let (_, max_rate) = storage.inject_withdraw_range(period, hi)?;
                (lo * retained + min_rate, hi * retained + max_rate)
            } else {
                (lo, hi)
            };
            let (next_lo, next_hi) = feasible[level + 1];
            let lower = reach_lo.max(next_lo);
            let upper = reach_hi.min(next_hi);
            if lower > upper + tolerance {
                return Err(ValuationError::InfeasibleInventory {
                    period: periods[level + 1].to_string(),
                    inventory,
                    min: next_lo,
                    max: next_hi,
                });
            }
            bounds.push((lower, upper.max(lower)));
        }

        Ok(Self { periods, bounds })
    }

    /// Periods covered, valuation date to storage end inclusive.
    #[inline]
    pub fn periods(&self) -> &[P] {
        &self.periods
    }

    /// `(min, max)` inventory on `period`, or `None` outside the horizon.
    pub fn bounds(&self, period: &P) -> Option<(f64, f64)> {
        let first = self.periods.first()?;
        let index = usize::try_from(period.periods_since(first)).ok()?;
        self.bounds.get(index).copied()
    }

    /// Iterate `(period, (min, max))`.
    pub fn iter(&self) -> impl Iterator<Item = (P, (f64, f64))> + '_ {
        self.periods.iter().copied().zip(self.bounds.iter().copied())
    }
}

/// Inventories on `period` from which some feasible decision lands inside
/// `next` on the following period.
fn backward_bounds<P: TimePeriod>(
    storage: &StorageModel<P>,
    period: &P,
    (next_lo, next_hi): (f64, f64),
    solver: &BrentSolver<f64>,
) -> Result<(f64, f64), ValuationError> {
    let min_inventory = storage.min_inventory(period)?;
    let max_inventory = storage.max_inventory(period)?;
    let retained = 1.0 - storage.inventory_pcnt_loss(period)?;
    // Date validity is established here; the closures below only vary inventory
    storage.inject_withdraw_range(period, min_inventory)?;

    let highest_reach = |x: f64| {
        x * retained
            + storage
                .inject_withdraw_range(period, x)
                .map_or(0.0, |(_, max_rate)| max_rate)
    };
    let lowest_reach = |x: f64| {
        x * retained
            + storage
                .inject_withdraw_range(period, x)
                .map_or(0.0, |(min_rate, _)| min_rate)
    };
    let infeasible = || ValuationError::InfeasibleInventory {
        period: period.to_string(),
        inventory: f64::NAN,
        min: min_inventory,
        max: max_inventory,
    };

    let lower = if highest_reach(min_inventory) >= next_lo {
        min_inventory
    } else if highest_reach(max_inventory) < next_lo {
        return Err(infeasible());
    } else {
        solver.find_root(|x| highest_reach(x) - next_lo, min_inventory, max_inventory)?
    };

    let upper = if lowest_reach(max_inventory) <= next_hi {
        max_inventory
    } else if lowest_reach(min_inventory) > next_hi {
        return Err(infeasible());
    } else {
        solver.find_root(|x| lowest_reach(x) - next_hi, min_inventory, max_inventory)?
    };

    if lower > upper {
        return Err(infeasible());
    }
    Ok((lower, upper))
}
