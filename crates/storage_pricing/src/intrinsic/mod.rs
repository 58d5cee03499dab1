//! Intrinsic storage valuation.
//!
//! Values the storage as if the forward curve were the certain future spot
//! price: the same backward induction as the tree, on a lattice with one
//! node per period. A forward pass from the starting inventory then
//! records the optimal operating profile.
//!
//! - [`IntrinsicValuation`]: Engine
//! - [`IntrinsicResults`]: NPV and [`StorageProfile`]

mod profile;

pub use profile::{ProfileEntry, StorageProfile};

use std::time::Instant;

use serde::{Deserialize, Serialize};
use storage_core::types::TimePeriod;
use tracing::info;

use crate::config::{ConfigError, RunControl, TreeValuationSettings};
use crate::error::ValuationError;
use crate::tree::Transition;
use crate::valuation::{backward_induction, InductionPlan, InventorySpace, ValuationInputs};

/// NPV and operating profile of an intrinsic valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicResults<P: TimePeriod> {
    /// Sum of the profile's period PVs
    pub npv: f64,
    /// Optimal operation per period, valuation date to storage end
    pub profile: StorageProfile<P>,
}

/// Deterministic storage valuation against the forward curve.
///
/// # Examples
///
/// ```rust
/// use storage_core::market_data::{Curve, CurveAccessor};
/// use storage_core::types::Day;
/// use storage_models::storage::StorageModel;
/// use storage_pricing::config::TreeValuationSettings;
/// use storage_pricing::intrinsic::IntrinsicValuation;
/// use storage_pricing::valuation::{SettlementRule, ValuationInputs};
///
/// let start = Day::from_ymd(2019, 9, 1).unwrap();
/// let switch = Day::from_ymd(2019, 9, 3).unwrap();
/// let end = Day::from_ymd(2019, 9, 5).unwrap();
/// let storage = StorageModel::builder(start, end)
///     .injection_cost(0.0)
///     .withdrawal_cost(0.0)
///     .min_inventory(0.0)
///     .max_inventory(20.0)
///     .max_injection_rate(10.0)
///     .max_withdrawal_rate(10.0)
///     .build()
///     .unwrap();
///
/// let forwards = Curve::piecewise_flat(&[(start, 10.0), (switch, 30.0)], end).unwrap();
/// let rates = CurveAccessor::from(0.0);
/// let settlement = SettlementRule::identity();
/// let inputs = ValuationInputs::new(&storage, start, 0.0, &forwards, &rates, &settlement);
///
/// let results = IntrinsicValuation::new(TreeValuationSettings::default())
///     .unwrap()
///     .value(&inputs)
///     .unwrap();
/// assert!((results.npv - 400.0).abs() < 1e-9);
/// assert_eq!(results.profile.len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct IntrinsicValuation {
    settings: TreeValuationSettings,
    control: RunControl,
}

impl IntrinsicValuation {
    /// Create an engine with validated settings. Only the grid density and
    /// solver tolerance are used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the settings are invalid.
    pub fn new(settings: TreeValuationSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            settings,
            control: RunControl::new(),
        })
    }

    /// Attach cancellation and progress reporting.
    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    /// Value the storage.
    ///
    /// A valuation date after storage end gives zero NPV and an empty
    /// profile. On the end date itself only the terminal value is credited.
    ///
    /// # Errors
    ///
    /// - `InfeasibleInventory` if the starting inventory cannot satisfy the constraints
    /// - `InvalidForwardPrice` if a forward price is not finite
    /// - `Curve` if a forward or interest rate is missing
    /// - `Cancelled` if the run is cancelled
    pub fn value<P: TimePeriod>(
        &self,
        inputs: &ValuationInputs<'_, P>,
    ) -> Result<IntrinsicResults<P>, ValuationError> {
        let started = Instant::now();
        let storage = inputs.storage;
        let end = storage.end();

        if inputs.val_date > end {
            return Ok(IntrinsicResults {
                npv: 0.0,
                profile: StorageProfile::default(),
            });
        }
        if inputs.val_date == end {
            let min = storage.min_inventory(&end)?;
            let max = storage.max_inventory(&end)?;
            if inputs.inventory < min || inputs.inventory > max {
                return Err(ValuationError::InfeasibleInventory {
                    period: end.to_string(),
                    inventory: inputs.inventory,
                    min,
                    max,
                });
            }
            let price = inputs.forward_curve.get(&end)?;
            return Ok(IntrinsicResults {
                npv: storage.terminal_storage_npv(price, inputs.inventory),
                profile: StorageProfile::default(),
            });
        }

        let space = InventorySpace::compute(
            storage,
            inputs.val_date,
            inputs.inventory,
            self.settings.solver_tolerance(),
        )?;

        let periods = inputs.horizon();
        let num_steps = periods.len() - 1;
        info!(
            val_date = %inputs.val_date,
            end = %end,
            num_steps,
            grid_points = self.settings.num_inventory_grid_points(),
            "Starting intrinsic valuation"
        );

        let forwards = inputs.forward_prices(&periods)?;
        if let Some((period, &value)) = periods
            .iter()
            .zip(&forwards)
            .find(|(_, f)| !f.is_finite())
        {
            return Err(ValuationError::InvalidForwardPrice {
                period: period.to_string(),
                value,
            });
        }

        let plan = InductionPlan::build(inputs, &space, self.settings.num_inventory_grid_points())?;
        let prices: Vec<Vec<f64>> = forwards.iter().map(|&f| vec![f]).collect();
        let path = Transition::certain(0);
        let transitions = vec![vec![path]; num_steps];
        let solved = backward_induction(&plan, &prices, &transitions, &self.control, true)?;

        let mut entries = Vec::with_capacity(periods.len());
        let mut inventory = inputs.inventory;
        for step in 0..num_steps {
            let decision = plan.decide_at(
                step,
                inventory,
                forwards[step],
                &path,
                &solved.levels[step + 1],
            )?;
            let rates = plan.rates(step);
            let volume = decision.volume;
            let loss = inventory * rates.loss;
            let period_pv = rates.cash_flow(volume, forwards[step], inventory);
            inventory = inventory - loss + volume;
            entries.push(ProfileEntry {
                period: periods[step],
                inventory,
                inject_withdraw: volume,
                cmdty_consumed: rates.consumed(volume),
                inventory_loss: loss,
                net_position: rates.net_position(volume),
                period_pv,
            });
        }
        entries.push(ProfileEntry {
            period: end,
            inventory,
            inject_withdraw: 0.0,
            cmdty_consumed: 0.0,
            inventory_loss: 0.0,
            net_position: 0.0,
            period_pv: storage.terminal_storage_npv(forwards[num_steps], inventory),
        });

        let profile = StorageProfile::new(entries);
        let npv = profile.total_pv();
        info!(
            npv,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Intrinsic valuation complete"
        );
        Ok(IntrinsicResults { npv, profile })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::SettlementRule;
    use approx::assert_relative_eq;
    use storage_core::market_data::{Curve, CurveAccessor};
    use storage_core::types::Day;
    use storage_models::storage::StorageModel;

    fn day(m: u32, d: u32) -> Day {
        Day::from_ymd(2019, m, d).unwrap()
    }

    fn engine() -> IntrinsicValuation {
        IntrinsicValuation::new(
            TreeValuationSettings::builder()
                .num_inventory_grid_points(11)
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    fn storage() -> StorageModel<Day> {
        StorageModel::builder(day(9, 1), day(9, 7))
            .injection_cost(0.5)
            .withdrawal_cost(0.25)
            .min_inventory(0.0)
            .max_inventory(100.0)
            .max_injection_rate(25.0)
            .max_withdrawal_rate(50.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_profile_follows_spread() {
        let storage = storage();
        let forwards =
            Curve::piecewise_flat(&[(day(9, 1), 10.0), (day(9, 5), 20.0)], day(9, 7)).unwrap();
        let rates = CurveAccessor::from(0.0);
        let rule = SettlementRule::identity();
        let inputs = ValuationInputs::new(&storage, day(9, 1), 0.0, &forwards, &rates, &rule);

        let results = engine().value(&inputs).unwrap();
        // Inject 25/day for 4 days, withdraw 50/day for 2 days
        assert_relative_eq!(results.npv, 100.0 * (20.0 - 10.0 - 0.5 - 0.25), epsilon = 1e-9);

        let volumes: Vec<f64> = results.profile.iter().map(|e| e.inject_withdraw).collect();
        for (actual, expected) in volumes.iter().zip([25.0, 25.0, 25.0, 25.0, -50.0, -50.0, 0.0]) {
            assert_relative_eq!(*actual, expected, epsilon = 1e-9);
        }
        let last = results.profile.get(&day(9, 7)).unwrap();
        assert_relative_eq!(last.inventory, 0.0, epsilon = 1e-9);
        assert_relative_eq!(
            results.profile.get(&day(9, 5)).unwrap().net_position,
            50.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_expired_storage() {
        let storage = storage();
        let forwards = Curve::constant(day(9, 1), day(9, 7), 10.0).unwrap();
        let rates = CurveAccessor::from(0.03);
        let rule = SettlementRule::identity();
        let inputs = ValuationInputs::new(&storage, day(9, 8), 0.0, &forwards, &rates, &rule);
        let results = engine().value(&inputs).unwrap();
        assert_eq!(results.npv, 0.0);
        assert!(results.profile.is_empty());
    }

    #[test]
    fn test_valuation_on_end_credits_terminal_value() {
        let storage = StorageModel::builder(day(9, 1), day(9, 7))
            .injection_cost(0.5)
            .withdrawal_cost(0.25)
            .min_inventory(0.0)
            .max_inventory(100.0)
            .max_injection_rate(25.0)
            .max_withdrawal_rate(50.0)
            .terminal_storage_npv(|price, inventory| price * inventory * 0.5)
            .build()
            .unwrap();
        let forwards = Curve::constant(day(9, 1), day(9, 7), 10.0).unwrap();
        let rates = CurveAccessor::from(0.03);
        let rule = SettlementRule::identity();

        let inputs = ValuationInputs::new(&storage, day(9, 7), 40.0, &forwards, &rates, &rule);
        let results = engine().value(&inputs).unwrap();
        assert_eq!(results.npv, 200.0);
        assert!(results.profile.is_empty());

        let inputs = ValuationInputs::new(&storage, day(9, 7), 140.0, &forwards, &rates, &rule);
        assert!(matches!(
            engine().value(&inputs),
            Err(ValuationError::InfeasibleInventory { .. })
        ));
    }

    #[test]
    fn test_missing_forward_reported() {
        let storage = storage();
        let forwards = Curve::constant(day(9, 1), day(9, 6), 10.0).unwrap();
        let rates = CurveAccessor::from(0.0);
        let rule = SettlementRule::identity();
        let inputs = ValuationInputs::new(&storage, day(9, 1), 0.0, &forwards, &rates, &rule);
        assert!(matches!(engine().value(&inputs), Err(ValuationError::Curve(_))));
    }
}
