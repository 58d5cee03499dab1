//! Backward induction over a price lattice and the inventory grids.
//!
//! Values for one level are held in a flat node-major buffer of
//! `num_nodes x grid_len` doubles. Two buffers are swapped per step; each
//! step is solved in parallel over price nodes.

use rayon::prelude::*;
use storage_core::types::TimePeriod;

use super::plan::{Decision, InductionPlan};
use crate::config::RunControl;
use crate::error::ValuationError;
use crate::tree::Transition;

/// Result of one backward induction.
#[derive(Debug, Clone)]
pub(crate) struct InductionOutput {
    /// Optimal decision and value at the valuation node
    pub root: Decision,
    /// Value buffers for every level, populated only when requested
    pub levels: Vec<Vec<f64>>,
}

/// Solve the storage dynamic programme on `prices` / `transitions`.
///
/// `prices[m]` holds the spot price of every node on level `m` and
/// `transitions[m]` their branches into level `m + 1`. When `keep_levels`
/// is set, every level's value buffer is returned for a later forward pass.
pub(crate) fn backward_induction<P: TimePeriod>(
    plan: &InductionPlan<'_, P>,
    prices: &[Vec<f64>],
    transitions: &[Vec<Transition>],
    control: &RunControl,
    keep_levels: bool,
) -> Result<InductionOutput, ValuationError> {
    let num_steps = plan.num_steps();
    let storage = plan.storage();

    let terminal_grid = plan.grid(num_steps);
    let mut next: Vec<f64> = prices[num_steps]
        .iter()
        .flat_map(|&price| {
            terminal_grid
                .iter()
                .map(move |&inventory| storage.terminal_storage_npv(price, inventory))
        })
        .collect();

    let mut levels = if keep_levels {
        vec![Vec::new(); num_steps + 1]
    } else {
        Vec::new()
    };
    if keep_levels {
        levels[num_steps] = next.clone();
    }

    let mut current = Vec::new();
    for step in (1..num_steps).rev() {
        if control.is_cancelled() {
            return Err(ValuationError::Cancelled);
        }

        let grid_len = plan.grid(step).len();
        let step_prices = &prices[step];
        let step_transitions = &transitions[step];
        current.clear();
        current.resize(step_prices.len() * grid_len, 0.0);

        let next_values = &next;
        current
            .par_chunks_mut(grid_len)
            .enumerate()
            .for_each(|(node, row)| {
                let mut candidates = Vec::new();
                for (point, value) in row.iter_mut().enumerate() {
                    *value = plan
                        .optimise_grid_point(
                            step,
                            point,
                            step_prices[node],
                            &step_transitions[node],
                            next_values,
                            &mut candidates,
                        )
                        .value;
                }
            });

        std::mem::swap(&mut current, &mut next);
        if keep_levels {
            levels[step] = next.clone();
        }
        control.report((num_steps - step) as f64 / num_steps as f64);
    }

    if control.is_cancelled() {
        return Err(ValuationError::Cancelled);
    }
    let root = plan.optimise_grid_point(
        0,
        0,
        prices[0][0],
        &transitions[0][0],
        &next,
        &mut Vec::new(),
    );
    if keep_levels {
        levels[0] = vec![root.value];
    }
    control.report(1.0);

    Ok(InductionOutput { root, levels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CancellationToken;
    use crate::valuation::{InventorySpace, SettlementRule, ValuationInputs};
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};
    use storage_core::market_data::{Curve, CurveAccessor};
    use storage_core::types::Day;
    use storage_models::storage::StorageModel;

    fn day(m: u32, d: u32) -> Day {
        Day::from_ymd(2019, m, d).unwrap()
    }

    fn storage() -> StorageModel<Day> {
        StorageModel::builder(day(9, 1), day(9, 5))
            .injection_cost(0.0)
            .withdrawal_cost(0.0)
            .min_inventory(0.0)
            .max_inventory(20.0)
            .max_injection_rate(10.0)
            .max_withdrawal_rate(10.0)
            .build()
            .unwrap()
    }

    fn build_plan<'a>(inputs: &ValuationInputs<'a, Day>) -> InductionPlan<'a, Day> {
        let space =
            InventorySpace::compute(inputs.storage, inputs.val_date, inputs.inventory, 1e-10)
                .unwrap();
        InductionPlan::build(inputs, &space, 5).unwrap()
    }

    fn deterministic(forwards: &[f64]) -> (Vec<Vec<f64>>, Vec<Vec<Transition>>) {
        let prices = forwards.iter().map(|&f| vec![f]).collect();
        let transitions = vec![vec![Transition::certain(0)]; forwards.len() - 1];
        (prices, transitions)
    }

    #[test]
    fn test_buy_low_sell_high() {
        let storage = storage();
        let forward_curve = Curve::from_contiguous(day(9, 1), &[10.0, 10.0, 30.0, 30.0, 0.0]).unwrap();
        let rates = CurveAccessor::from(0.0);
        let rule = SettlementRule::identity();
        let inputs = ValuationInputs::new(&storage, day(9, 1), 0.0, &forward_curve, &rates, &rule);
        let plan = build_plan(&inputs);
        let (prices, transitions) = deterministic(&[10.0, 10.0, 30.0, 30.0, 0.0]);

        let output =
            backward_induction(&plan, &prices, &transitions, &RunControl::new(), false).unwrap();
        // Inject 20 at 10, withdraw 20 at 30
        assert_relative_eq!(output.root.value, 400.0, epsilon = 1e-9);
        assert_relative_eq!(output.root.volume, 10.0, epsilon = 1e-12);
        assert!(output.levels.is_empty());
    }

    #[test]
    fn test_keep_levels() {
        let storage = storage();
        let forward_curve = Curve::constant(day(9, 1), day(9, 5), 10.0).unwrap();
        let rates = CurveAccessor::from(0.0);
        let rule = SettlementRule::identity();
        let inputs = ValuationInputs::new(&storage, day(9, 1), 0.0, &forward_curve, &rates, &rule);
        let plan = build_plan(&inputs);
        let (prices, transitions) = deterministic(&[10.0; 5]);

        let output =
            backward_induction(&plan, &prices, &transitions, &RunControl::new(), true).unwrap();
        assert_eq!(output.levels.len(), 5);
        assert_eq!(output.levels[0], vec![output.root.value]);
        assert_eq!(output.levels[4], vec![0.0; 5]);
        assert_eq!(output.root.value, 0.0);
    }

    #[test]
    fn test_cancellation() {
        let storage = storage();
        let forward_curve = Curve::constant(day(9, 1), day(9, 5), 10.0).unwrap();
        let rates = CurveAccessor::from(0.0);
        let rule = SettlementRule::identity();
        let inputs = ValuationInputs::new(&storage, day(9, 1), 0.0, &forward_curve, &rates, &rule);
        let plan = build_plan(&inputs);
        let (prices, transitions) = deterministic(&[10.0; 5]);

        let token = CancellationToken::new();
        token.cancel();
        let control = RunControl::new().with_cancellation(token);
        assert_eq!(
            backward_induction(&plan, &prices, &transitions, &control, false).unwrap_err(),
            ValuationError::Cancelled
        );
    }

    #[test]
    fn test_progress_reaches_one() {
        let storage = storage();
        let forward_curve = Curve::constant(day(9, 1), day(9, 5), 10.0).unwrap();
        let rates = CurveAccessor::from(0.0);
        let rule = SettlementRule::identity();
        let inputs = ValuationInputs::new(&storage, day(9, 1), 0.0, &forward_curve, &rates, &rule);
        let plan = build_plan(&inputs);
        let (prices, transitions) = deterministic(&[10.0; 5]);

        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reported);
        let control = RunControl::new().with_progress(move |p| sink.lock().unwrap().push(p));
        backward_induction(&plan, &prices, &transitions, &control, false).unwrap();

        let reported = reported.lock().unwrap();
        assert!(reported.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reported.last(), Some(&1.0));
    }
}
