//! Trinomial tree storage valuation engine.

use std::time::Instant;

use rayon::prelude::*;
use storage_core::types::TimePeriod;
use storage_models::models::Factor;
use tracing::{debug, info};

use super::lattice::TrinomialLattice;
use super::results::{DeltaContract, TreeValuationResults};
use crate::config::{ConfigError, RunControl, TreeValuationSettings};
use crate::error::ValuationError;
use crate::valuation::{backward_induction, InductionPlan, InventorySpace, ValuationInputs};

/// Values storage by backward induction on a one-factor mean-reverting
/// trinomial tree, and reports finite-difference forward deltas.
///
/// The spot price follows `ln S(t) = x(t) + a(t)` with `x` an
/// Ornstein–Uhlenbeck process whose mean reversion and volatility come from
/// a single [`Factor`]. The lattice is fitted so every period's expected
/// spot price equals its forward price.
///
/// # Examples
///
/// ```rust
/// use storage_core::market_data::{Curve, CurveAccessor};
/// use storage_core::types::Day;
/// use storage_models::models::Factor;
/// use storage_models::storage::StorageModel;
/// use storage_pricing::config::TreeValuationSettings;
/// use storage_pricing::tree::{DeltaContract, TrinomialTreeEngine};
/// use storage_pricing::valuation::{SettlementRule, ValuationInputs};
///
/// let start = Day::from_ymd(2019, 9, 1).unwrap();
/// let end = Day::from_ymd(2019, 9, 11).unwrap();
/// let storage = StorageModel::builder(start, end)
///     .injection_cost(0.01)
///     .withdrawal_cost(0.01)
///     .min_inventory(0.0)
///     .max_inventory(1000.0)
///     .max_injection_rate(100.0)
///     .max_withdrawal_rate(100.0)
///     .build()
///     .unwrap();
///
/// let forwards = Curve::constant(start, end, 20.0).unwrap();
/// let rates = CurveAccessor::from(0.0);
/// let settlement = SettlementRule::identity();
/// let inputs = ValuationInputs::new(&storage, start, 0.0, &forwards, &rates, &settlement);
///
/// let settings = TreeValuationSettings::builder()
///     .num_inventory_grid_points(21)
///     .build()
///     .unwrap();
/// let engine = TrinomialTreeEngine::new(settings).unwrap();
/// let results = engine
///     .value_with_deltas(&inputs, &Factor::new(5.0, 0.6), &[DeltaContract::Period(start)])
///     .unwrap();
///
/// assert!(results.npv > 0.0);
/// assert_eq!(results.deltas.len(), 1);
/// assert_eq!(results.num_steps(), 10);
/// ```
#[derive(Debug, Clone)]
pub struct TrinomialTreeEngine {
    settings: TreeValuationSettings,
    control: RunControl,
}

impl TrinomialTreeEngine {
    /// Create an engine with validated settings.
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

    /// Settings in use.
    #[inline]
    pub fn settings(&self) -> &TreeValuationSettings {
        &self.settings
    }

    /// Value the storage without deltas.
    pub fn value<P: TimePeriod>(
        &self,
        inputs: &ValuationInputs<'_, P>,
        spot: &Factor<P>,
    ) -> Result<TreeValuationResults<P>, ValuationError> {
        self.value_with_deltas(inputs, spot, &[])
    }

    /// Value the storage and bump each contract's forward prices by the
    /// configured delta bump. Contracts delivering entirely outside the tree
    /// horizon have zero delta.
    ///
    /// The valuation date may precede the storage start. The starting
    /// inventory is then held unchanged up to the start and earlier periods
    /// carry no decisions or costs. Their forwards and volatilities are still
    /// required to build the lattice.
    ///
    /// # Errors
    ///
    /// - `ValuationDateNotBeforeEnd` if the valuation date is not before storage end
    /// - `InfeasibleInventory` if the starting inventory cannot satisfy the constraints
    /// - `InvalidVolatility` / `InvalidMeanReversion` / `InvalidForwardPrice` on bad market data
    /// - `Curve` if a forward, volatility or interest rate is missing
    /// - `Cancelled` if the run is cancelled
    pub fn value_with_deltas<P: TimePeriod>(
        &self,
        inputs: &ValuationInputs<'_, P>,
        spot: &Factor<P>,
        contracts: &[DeltaContract<P>],
    ) -> Result<TreeValuationResults<P>, ValuationError> {
        let started = Instant::now();
        let storage = inputs.storage;
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
            end = %storage.end(),
            num_steps,
            grid_points = self.settings.num_inventory_grid_points(),
            num_deltas = contracts.len(),
            "Starting trinomial tree valuation"
        );

        let step_vols = periods[..num_steps]
            .iter()
            .map(|period| {
                let vol = spot.vol_at(period)?;
                if !(vol.is_finite() && vol > 0.0) {
                    return Err(ValuationError::InvalidVolatility {
                        period: period.to_string(),
                        value: vol,
                    });
                }
                Ok(vol)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let lattice =
            TrinomialLattice::build(&step_vols, spot.mean_reversion, self.settings.time_step())?;
        debug!(
            num_steps,
            max_nodes = (0..=num_steps).map(|m| lattice.num_nodes(m)).max().unwrap_or(1),
            "Built trinomial lattice"
        );

        let forwards = inputs.forward_prices(&periods)?;
        if let Some((period, &value)) = periods
            .iter()
            .zip(&forwards)
            .find(|(_, f)| !(f.is_finite() && **f > 0.0))
        {
            return Err(ValuationError::InvalidForwardPrice {
                period: period.to_string(),
                value,
            });
        }

        let plan = InductionPlan::build(inputs, &space, self.settings.num_inventory_grid_points())?;
        let spot_prices = lattice.price_levels(&forwards)?;
        let base = backward_induction(
            &plan,
            &spot_prices,
            lattice.all_transitions(),
            &self.control,
            false,
        )?;

        let bump = self.settings.delta_bump();
        let bump_control = self.control.without_progress();
        let deltas = contracts
            .par_iter()
            .map(|contract| {
                if !periods.iter().any(|p| contract.contains(p)) {
                    return Ok(0.0);
                }
                let (first, last) = contract.delivery();
                let bumped_curve = inputs.forward_curve.bumped(&first, &last, bump);
                let bumped_forwards = periods
                    .iter()
                    .map(|p| bumped_curve.get(p))
                    .collect::<Result<Vec<_>, _>>()?;
                let bumped_prices = lattice.price_levels(&bumped_forwards)?;
                let bumped = backward_induction(
                    &plan,
                    &bumped_prices,
                    lattice.all_transitions(),
                    &bump_control,
                    false,
                )?;
                debug!(
                    contract = ?contract,
                    bumped_npv = bumped.root.value,
                    "Bumped forward valuation"
                );
                Ok((bumped.root.value - base.root.value) / bump)
            })
            .collect::<Result<Vec<_>, ValuationError>>()?;

        info!(
            npv = base.root.value,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Trinomial tree valuation complete"
        );

        Ok(TreeValuationResults {
            npv: base.root.value,
            deltas,
            decision: base.root.volume,
            periods,
            spot_prices,
        })
    }
}
