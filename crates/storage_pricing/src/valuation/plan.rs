//! Price-independent part of the storage dynamic programme.
//!
//! Inventory grids, per-step cost rates, discount factors and feasible
//! decision windows depend only on the storage and the valuation inputs,
//! never on the simulated price. They are computed once and shared between
//! the base valuation and every bumped delta run.

use storage_core::math::interpolators::GridWeights;
use storage_core::types::TimePeriod;
use storage_models::storage::StorageModel;
use tracing::warn;

use super::{InventorySpace, ValuationInputs};
use crate::error::ValuationError;
use crate::tree::Transition;

/// Window width below which an empty decision window is treated as a
/// single feasible volume.
const WINDOW_TOLERANCE: f64 = 1e-9;

/// Optimal decision at one state and the value it attains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Decision {
    /// Net injection (+) or withdrawal (-) volume
    pub volume: f64,
    /// Immediate cash flow plus expected continuation value
    pub value: f64,
}

/// Feasible net injection/withdrawal volumes from one inventory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Window {
    pub lower: f64,
    pub upper: f64,
}

/// Storage rates for the step starting on one period, per unit volume or
/// inventory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StepRates {
    /// False before the storage start: no decisions, costs or losses
    pub active: bool,
    pub injection_cost: f64,
    pub withdrawal_cost: f64,
    pub consumed_inject: f64,
    pub consumed_withdraw: f64,
    pub loss: f64,
    pub inventory_cost: f64,
    /// Discount factor from the commodity settlement period
    pub cmdty_discount: f64,
    /// Discount factor from the period the operating costs are incurred
    pub cost_discount: f64,
}

impl StepRates {
    const INACTIVE: Self = Self {
        active: false,
        injection_cost: 0.0,
        withdrawal_cost: 0.0,
        consumed_inject: 0.0,
        consumed_withdraw: 0.0,
        loss: 0.0,
        inventory_cost: 0.0,
        cmdty_discount: 1.0,
        cost_discount: 1.0,
    };

    /// Inventory carried into the next period before the decision volume.
    #[inline]
    pub fn retained(&self, inventory: f64) -> f64 {
        inventory * (1.0 - self.loss)
    }

    /// Commodity consumed by moving `volume`.
    #[inline]
    pub fn consumed(&self, volume: f64) -> f64 {
        if volume > 0.0 {
            self.consumed_inject * volume
        } else if volume < 0.0 {
            -self.consumed_withdraw * volume
        } else {
            0.0
        }
    }

    /// Discounted commodity position taken by moving `volume`: positive when
    /// selling, negative when buying.
    #[inline]
    pub fn net_position(&self, volume: f64) -> f64 {
        if !self.active || volume == 0.0 {
            return 0.0;
        }
        -(volume + self.consumed(volume)) * self.cmdty_discount
    }

    /// Discounted cash flow of moving `volume` at spot `price` while holding
    /// `inventory`. Consumed commodity is bought at spot.
    #[inline]
    pub fn cash_flow(&self, volume: f64, price: f64, inventory: f64) -> f64 {
        if !self.active {
            return 0.0;
        }
        let cmdty = -(volume + self.consumed(volume)) * price * self.cmdty_discount;
        let operating = if volume > 0.0 {
            self.injection_cost * volume
        } else {
            -self.withdrawal_cost * volume
        };
        cmdty - (operating + self.inventory_cost * inventory) * self.cost_discount
    }
}

/// Grids, rates and decision windows for every step from the valuation date
/// to the storage end.
///
/// Level `m` is the period `val_date + m`; the last level is the storage end,
/// where only the terminal value is credited.
#[derive(Debug)]
pub(crate) struct InductionPlan<'a, P: TimePeriod> {
    storage: &'a StorageModel<P>,
    periods: Vec<P>,
    grids: Vec<Vec<f64>>,
    rates: Vec<StepRates>,
    windows: Vec<Vec<Window>>,
}

impl<'a, P: TimePeriod> InductionPlan<'a, P> {
    /// Build the plan over `space`, which must cover the valuation horizon.
    ///
    /// Each level's grid spans the inventory space on its period. Level 0
    /// and every period up to the storage start collapse to the starting
    /// inventory.
    pub fn build(
        inputs: &ValuationInputs<'a, P>,
        space: &InventorySpace<P>,
        num_grid_points: usize,
    ) -> Result<Self, ValuationError> {
        let storage = inputs.storage;
        let periods = inputs.horizon();
        let num_steps = periods.len().saturating_sub(1);

        let grids = periods
            .iter()
            .enumerate()
            .map(|(level, period)| {
                if level == 0 || *period <= storage.start() {
                    return Ok(vec![inputs.inventory]);
                }
                // Already intersected with the period's min/max inventory
                let bounds = space.bounds(period).ok_or_else(|| {
                    ValuationError::InfeasibleInventory {
                        period: period.to_string(),
                        inventory: inputs.inventory,
                        min: f64::NAN,
                        max: f64::NAN,
                    }
                })?;
                inventory_grid(period, bounds, num_grid_points)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rates = periods[..num_steps]
            .iter()
            .map(|period| step_rates(inputs, period))
            .collect::<Result<Vec<_>, _>>()?;

        let mut windows = Vec::with_capacity(num_steps);
        for step in 0..num_steps {
            let mut clamped = 0usize;
            let level_windows = grids[step]
                .iter()
                .map(|&inventory| {
                    let (window, was_clamped) = decision_window(
                        storage,
                        &periods[step],
                        &rates[step],
                        inventory,
                        &grids[step + 1],
                    )?;
                    clamped += usize::from(was_clamped);
                    Ok(window)
                })
                .collect::<Result<Vec<_>, ValuationError>>()?;
            if clamped > 0 {
                warn!(
                    period = %periods[step],
                    grid_points = clamped,
                    "Next-period inventory bounds unreachable; decisions clamped"
                );
            }
            windows.push(level_windows);
        }

        Ok(Self {
            storage,
            periods,
            grids,
            rates,
            windows,
        })
    }

    /// Number of decision steps (levels minus one).
    #[inline]
    pub fn num_steps(&self) -> usize {
        self.rates.len()
    }

    #[inline]
    pub fn grid(&self, level: usize) -> &[f64] {
        &self.grids[level]
    }

    #[inline]
    pub fn rates(&self, step: usize) -> &StepRates {
        &self.rates[step]
    }

    #[inline]
    pub fn storage(&self) -> &StorageModel<P> {
        self.storage
    }

    /// Optimal decision at grid point `point` of level `step`.
    #[inline]
    pub fn optimise_grid_point(
        &self,
        step: usize,
        point: usize,
        price: f64,
        transition: &Transition,
        next_values: &[f64],
        candidates: &mut Vec<f64>,
    ) -> Decision {
        self.optimise(
            step,
            self.grids[step][point],
            self.windows[step][point],
            price,
            transition,
            next_values,
            candidates,
        )
    }

    /// Optimal decision at an arbitrary inventory on level `step`.
    pub fn decide_at(
        &self,
        step: usize,
        inventory: f64,
        price: f64,
        transition: &Transition,
        next_values: &[f64],
    ) -> Result<Decision, ValuationError> {
        let (window, _) = decision_window(
            self.storage,
            &self.periods[step],
            &self.rates[step],
            inventory,
            &self.grids[step + 1],
        )?;
        let mut candidates = Vec::new();
        Ok(self.optimise(
            step,
            inventory,
            window,
            price,
            transition,
            next_values,
            &mut candidates,
        ))
    }

    /// Maximise cash flow plus expected continuation value over the window.
    ///
    /// Both terms are piecewise linear in the volume: the cash flow kinks at
    /// zero and the interpolated continuation value kinks wherever the
    /// resulting inventory crosses a next-level grid point. The maximum is
    /// therefore attained at one of those breakpoints or a window endpoint.
    /// Ties go to the larger volume.
    #[allow(clippy::too_many_arguments)]
    fn optimise(
        &self,
        step: usize,
        inventory: f64,
        window: Window,
        price: f64,
        transition: &Transition,
        next_values: &[f64],
        candidates: &mut Vec<f64>,
    ) -> Decision {
        let rates = &self.rates[step];
        let next_grid = &self.grids[step + 1];
        let retained = rates.retained(inventory);

        candidates.clear();
        candidates.push(window.lower);
        if window.upper > window.lower {
            candidates.push(window.upper);
            if window.lower < 0.0 && window.upper > 0.0 {
                candidates.push(0.0);
            }
            let first = next_grid.partition_point(|&x| x <= retained + window.lower);
            let last = next_grid.partition_point(|&x| x < retained + window.upper);
            if first < last {
                candidates.extend(next_grid[first..last].iter().map(|&x| x - retained));
            }
            candidates.sort_by(f64::total_cmp);
        }

        let row_len = next_grid.len();
        let mut best = Decision {
            volume: window.lower,
            value: f64::NEG_INFINITY,
        };
        for &volume in candidates.iter() {
            let weights = GridWeights::locate(next_grid, retained + volume);
            let continuation: f64 = transition
                .children
                .iter()
                .zip(&transition.probabilities)
                .map(|(&child, &p)| {
                    p * weights.apply(&next_values[child * row_len..(child + 1) * row_len])
                })
                .sum();
            let value = rates.cash_flow(volume, price, inventory) + continuation;
            if value >= best.value {
                best = Decision { volume, value };
            }
        }
        best
    }
}

/// `num_points` evenly spaced inventory levels over `(min, max)`.
fn inventory_grid<P: TimePeriod>(
    period: &P,
    (min, max): (f64, f64),
    num_points: usize,
) -> Result<Vec<f64>, ValuationError> {
    if !(min.is_finite() && max.is_finite()) || min > max {
        return Err(ValuationError::InfeasibleInventory {
            period: period.to_string(),
            inventory: min,
            min,
            max,
        });
    }
    if max - min <= WINDOW_TOLERANCE || num_points < 2 {
        return Ok(vec![min]);
    }
    let spacing = (max - min) / (num_points - 1) as f64;
    Ok((0..num_points)
        .map(|i| {
            if i == num_points - 1 {
                max
            } else {
                min + i as f64 * spacing
            }
        })
        .collect())
}

fn step_rates<P: TimePeriod>(
    inputs: &ValuationInputs<'_, P>,
    period: &P,
) -> Result<StepRates, ValuationError> {
    let storage = inputs.storage;
    if *period < storage.start() {
        return Ok(StepRates::INACTIVE);
    }
    let settlement = inputs.settlement_rule.settle(period);
    Ok(StepRates {
        active: true,
        injection_cost: storage.injection_cost(period, 0.0, 1.0)?,
        withdrawal_cost: storage.withdrawal_cost(period, 0.0, 1.0)?,
        consumed_inject: storage.cmdty_consumed_inject(period, 0.0, 1.0)?,
        consumed_withdraw: storage.cmdty_consumed_withdraw(period, 0.0, 1.0)?,
        loss: storage.inventory_pcnt_loss(period)?,
        inventory_cost: storage.inventory_cost(period, 1.0)?,
        cmdty_discount: inputs.discount_factor(&settlement)?,
        cost_discount: inputs.discount_factor(period)?,
    })
}

/// Feasible volumes from `inventory`, clipped so the next-period inventory
/// stays within the next grid. When no volume can reach the next grid the
/// window collapses onto the rate limit closest to it; the flag reports this.
fn decision_window<P: TimePeriod>(
    storage: &StorageModel<P>,
    period: &P,
    rates: &StepRates,
    inventory: f64,
    next_grid: &[f64],
) -> Result<(Window, bool), ValuationError> {
    if !rates.active {
        return Ok((
            Window {
                lower: 0.0,
                upper: 0.0,
            },
            false,
        ));
    }
    let (min_rate, max_rate) = storage.inject_withdraw_range(period, inventory)?;
    let retained = rates.retained(inventory);
    let next_min = next_grid[0];
    let next_max = next_grid[next_grid.len() - 1];

    let lower = min_rate.max(next_min - retained);
    let upper = max_rate.min(next_max - retained);
    if lower <= upper {
        return Ok((Window { lower, upper }, false));
    }
    if lower - upper <= WINDOW_TOLERANCE {
        return Ok((
            Window {
                lower: upper,
                upper,
            },
            false,
        ));
    }
    let volume = if retained + max_rate < next_min {
        max_rate
    } else {
        min_rate
    };
    Ok((
        Window {
            lower: volume,
            upper: volume,
        },
        true,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::SettlementRule;
    use approx::assert_relative_eq;
    use storage_core::market_data::{Curve, CurveAccessor};
    use storage_core::types::Day;

    fn day(m: u32, d: u32) -> Day {
        Day::from_ymd(2019, m, d).unwrap()
    }

    fn build_plan<'a>(
        inputs: &ValuationInputs<'a, Day>,
        num_grid_points: usize,
    ) -> InductionPlan<'a, Day> {
        let space =
            InventorySpace::compute(inputs.storage, inputs.val_date, inputs.inventory, 1e-10)
                .unwrap();
        InductionPlan::build(inputs, &space, num_grid_points).unwrap()
    }

    fn storage() -> StorageModel<Day> {
        StorageModel::builder(day(9, 5), day(9, 10))
            .injection_cost(0.5)
            .withdrawal_cost(0.25)
            .cmdty_consumed_inject(0.01)
            .cmdty_consumed_withdraw(0.02)
            .inventory_loss(0.1)
            .inventory_cost(0.05)
            .min_inventory(0.0)
            .max_inventory(100.0)
            .max_injection_rate(10.0)
            .max_withdrawal_rate(20.0)
            .build()
            .unwrap()
    }

    // ========================================
    // Cash Flow Tests
    // ========================================

    #[test]
    fn test_cash_flow_injection_and_withdrawal() {
        let rates = StepRates {
            active: true,
            injection_cost: 0.5,
            withdrawal_cost: 0.25,
            consumed_inject: 0.01,
            consumed_withdraw: 0.02,
            loss: 0.0,
            inventory_cost: 0.05,
            cmdty_discount: 0.9,
            cost_discount: 0.95,
        };
        // Inject 10 at 20: buy 10.1 units, pay 5 cost, hold 40 for 2
        assert_relative_eq!(
            rates.cash_flow(10.0, 20.0, 40.0),
            -10.1 * 20.0 * 0.9 - (5.0 + 2.0) * 0.95,
            epsilon = 1e-12
        );
        // Withdraw 10 at 20: sell 10, buy back 0.2 consumed
        assert_relative_eq!(
            rates.cash_flow(-10.0, 20.0, 40.0),
            9.8 * 20.0 * 0.9 - (2.5 + 2.0) * 0.95,
            epsilon = 1e-12
        );
        assert_relative_eq!(rates.cash_flow(0.0, 20.0, 40.0), -2.0 * 0.95, epsilon = 1e-12);

        assert_relative_eq!(rates.net_position(10.0), -10.1 * 0.9, epsilon = 1e-12);
        assert_relative_eq!(rates.net_position(-10.0), 9.8 * 0.9, epsilon = 1e-12);
        assert_eq!(rates.net_position(0.0), 0.0);
    }

    #[test]
    fn test_inactive_rates() {
        let rates = StepRates::INACTIVE;
        assert_eq!(rates.cash_flow(5.0, 20.0, 40.0), 0.0);
        assert_eq!(rates.retained(40.0), 40.0);
    }

    // ========================================
    // Plan Tests
    // ========================================

    #[test]
    fn test_grids_before_and_after_start() {
        let storage = storage();
        let forwards = Curve::constant(day(9, 1), day(9, 10), 50.0).unwrap();
        let rates = CurveAccessor::from(0.0);
        let rule = SettlementRule::identity();
        let inputs = ValuationInputs::new(&storage, day(9, 3), 30.0, &forwards, &rates, &rule);
        let plan = build_plan(&inputs, 11);

        assert_eq!(plan.num_steps(), 7);
        // 09-03, 09-04, 09-05 hold the starting inventory
        for level in 0..3 {
            assert_eq!(plan.grid(level), &[30.0]);
        }
        // 09-06: 27 retained, reachable [7, 37]
        assert_eq!(plan.grid(3).len(), 11);
        assert_relative_eq!(plan.grid(3)[0], 7.0, epsilon = 1e-9);
        assert_relative_eq!(plan.grid(3)[1], 10.0, epsilon = 1e-9);
        assert_relative_eq!(plan.grid(3)[10], 37.0, epsilon = 1e-9);
        // Full injection every day from 09-06 on
        let top = [43.3, 48.97, 54.073, 58.6657];
        for (level, expected) in (4..8).zip(top) {
            assert_relative_eq!(plan.grid(level)[0], 0.0, epsilon = 1e-9);
            assert_relative_eq!(plan.grid(level)[10], expected, epsilon = 1e-9);
        }

        assert!(!plan.rates(0).active);
        assert!(!plan.rates(1).active);
        assert!(plan.rates(2).active);
    }

    #[test]
    fn test_windows_respect_next_bounds() {
        let storage = storage();
        let forwards = Curve::constant(day(9, 5), day(9, 10), 50.0).unwrap();
        let rates = CurveAccessor::from(0.0);
        let rule = SettlementRule::identity();
        let inputs = ValuationInputs::new(&storage, day(9, 5), 5.0, &forwards, &rates, &rule);
        let plan = build_plan(&inputs, 11);

        // Retained 4.5; withdrawal limited to 4.5
        let window = plan.windows[0][0];
        assert_relative_eq!(window.lower, -4.5, epsilon = 1e-12);
        assert_relative_eq!(window.upper, 10.0, epsilon = 1e-12);

        // Top of 09-06 band: 14.5 held, 13.05 retained
        assert_relative_eq!(plan.grid(1)[10], 14.5, epsilon = 1e-12);
        let top = plan.windows[1][10];
        assert_relative_eq!(top.lower, -13.05, epsilon = 1e-12);
        assert_relative_eq!(top.upper, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_optimise_prefers_larger_volume_on_ties() {
        let storage = StorageModel::builder(day(9, 5), day(9, 7))
            .injection_cost(0.0)
            .withdrawal_cost(0.0)
            .min_inventory(0.0)
            .max_inventory(10.0)
            .max_injection_rate(10.0)
            .max_withdrawal_rate(10.0)
            .build()
            .unwrap();
        let forwards = Curve::constant(day(9, 5), day(9, 7), 50.0).unwrap();
        let rates = CurveAccessor::from(0.0);
        let rule = SettlementRule::identity();
        let inputs = ValuationInputs::new(&storage, day(9, 5), 0.0, &forwards, &rates, &rule);
        let plan = build_plan(&inputs, 3);

        // Continuation worth exactly the spot price per unit: indifferent
        let next_values = [0.0, 250.0, 500.0];
        let decision = plan
            .decide_at(0, 0.0, 50.0, &Transition::certain(0), &next_values)
            .unwrap();
        assert_eq!(decision.volume, 10.0);
        assert_relative_eq!(decision.value, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_optimise_finds_interior_breakpoint() {
        let storage = StorageModel::builder(day(9, 5), day(9, 7))
            .injection_cost(0.0)
            .withdrawal_cost(0.0)
            .min_inventory(0.0)
            .max_inventory(10.0)
            .max_injection_rate(10.0)
            .max_withdrawal_rate(10.0)
            .build()
            .unwrap();
        let forwards = Curve::constant(day(9, 5), day(9, 7), 50.0).unwrap();
        let rates = CurveAccessor::from(0.0);
        let rule = SettlementRule::identity();
        let inputs = ValuationInputs::new(&storage, day(9, 5), 0.0, &forwards, &rates, &rule);
        let plan = build_plan(&inputs, 3);

        // Worth 60 per unit up to 5, nothing beyond
        let next_values = [0.0, 300.0, 300.0];
        let decision = plan
            .decide_at(0, 0.0, 50.0, &Transition::certain(0), &next_values)
            .unwrap();
        assert_relative_eq!(decision.volume, 5.0, epsilon = 1e-12);
        assert_relative_eq!(decision.value, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_grid_spans_inventory_space() {
        let storage = storage();
        let forwards = Curve::constant(day(9, 5), day(9, 10), 50.0).unwrap();
        let rates = CurveAccessor::from(0.0);
        let rule = SettlementRule::identity();
        let inputs = ValuationInputs::new(&storage, day(9, 5), 5.0, &forwards, &rates, &rule);
        let space = InventorySpace::compute(&storage, day(9, 5), 5.0, 1e-10).unwrap();
        let plan = InductionPlan::build(&inputs, &space, 21).unwrap();

        for (level, (_, (lo, hi))) in space.iter().enumerate().skip(1) {
            let grid = plan.grid(level);
            assert_eq!(grid.len(), 21);
            assert_eq!(grid[0], lo);
            assert_eq!(grid[20], hi);
            assert!(hi < 100.0);
        }
    }

    #[test]
    fn test_unreachable_bounds_clamp_to_nearest_rate() {
        let storage = StorageModel::builder(day(9, 5), day(9, 7))
            .injection_cost(0.0)
            .withdrawal_cost(0.0)
            .min_inventory(0.0)
            .max_inventory(100.0)
            .max_injection_rate(10.0)
            .max_withdrawal_rate(10.0)
            .build()
            .unwrap();
        let rates = StepRates {
            active: true,
            ..StepRates::INACTIVE
        };

        let (window, clamped) =
            decision_window(&storage, &day(9, 5), &rates, 0.0, &[50.0, 100.0]).unwrap();
        assert!(clamped);
        assert_eq!(
            window,
            Window {
                lower: 10.0,
                upper: 10.0
            }
        );

        let (window, clamped) =
            decision_window(&storage, &day(9, 5), &rates, 80.0, &[0.0, 40.0]).unwrap();
        assert!(clamped);
        assert_eq!(window.lower, -10.0);
    }

    #[test]
    fn test_inconsistent_bounds_rejected() {
        assert!(matches!(
            inventory_grid(&day(9, 5), (50.0, 10.0), 5),
            Err(ValuationError::InfeasibleInventory { .. })
        ));
        assert!(matches!(
            inventory_grid(&day(9, 5), (0.0, f64::INFINITY), 5),
            Err(ValuationError::InfeasibleInventory { .. })
        ));
        assert_eq!(inventory_grid(&day(9, 5), (30.0, 30.0), 5).unwrap(), vec![30.0]);
    }
}
