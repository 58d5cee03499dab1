//! Integration tests for trinomial tree storage valuation.
//!
//! # Test Categories
//!
//! 1. **Ratcheted storage**: Value and deltas with inventory-dependent rates
//! 2. **Deep in-the-money deltas**: Tree deltas match the intrinsic volumes
//! 3. **Optionality**: Tree value is never below intrinsic value

use approx::assert_relative_eq;
use storage_core::market_data::{Curve, CurveAccessor};
use storage_core::types::{Day, TimePeriod};
use storage_models::models::Factor;
use storage_models::storage::{Ratchet, RatchetInterp, RatchetPillar, StorageModel};
use storage_pricing::config::TreeValuationSettings;
use storage_pricing::intrinsic::IntrinsicValuation;
use storage_pricing::tree::{DeltaContract, TrinomialTreeEngine};
use storage_pricing::valuation::{SettlementRule, ValuationInputs};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn day(y: i32, m: u32, d: u32) -> Day {
    Day::from_ymd(y, m, d).unwrap()
}

/// Cash settles on the 20th of the month after delivery.
fn twentieth_of_next_month() -> SettlementRule<Day> {
    SettlementRule::new(|delivery: &Day| {
        let (year, month) = if delivery.month() == 12 {
            (delivery.year() + 1, 1)
        } else {
            (delivery.year(), delivery.month() + 1)
        };
        Day::from_ymd(year, month, 20).unwrap()
    })
}

fn tree_engine(num_inventory_grid_points: usize) -> TrinomialTreeEngine {
    let settings = TreeValuationSettings::builder()
        .num_inventory_grid_points(num_inventory_grid_points)
        .build()
        .unwrap();
    TrinomialTreeEngine::new(settings).unwrap()
}

fn ratchet_storage() -> StorageModel<Day> {
    StorageModel::builder(day(2019, 8, 28), day(2019, 9, 25))
        .injection_cost(0.015)
        .withdrawal_cost(0.02)
        .cmdty_consumed_inject(0.0001)
        .cmdty_consumed_withdraw(0.000088)
        .inventory_loss(0.001)
        .inventory_cost(0.002)
        .ratchets(vec![
            Ratchet::new(
                day(2019, 8, 28),
                vec![
                    RatchetPillar::new(0.0, -150.0, 255.2),
                    RatchetPillar::new(2000.0, -200.0, 175.0),
                ],
            ),
            Ratchet::new(
                day(2019, 9, 10),
                vec![
                    RatchetPillar::new(0.0, -170.5, 235.8),
                    RatchetPillar::new(700.0, -180.2, 200.77),
                    RatchetPillar::new(1800.0, -190.5, 174.45),
                ],
            ),
        ])
        .ratchet_interp(RatchetInterp::Linear)
        .terminal_storage_npv(|price, inventory| price * inventory - 15.4)
        .build()
        .unwrap()
}

/// Piecewise-flat series switching on 2019-09-12 and 2019-09-18.
fn ratchet_series(values: [f64; 3]) -> Curve<Day> {
    Curve::piecewise_flat(
        &[
            (day(2019, 9, 2), values[0]),
            (day(2019, 9, 12), values[1]),
            (day(2019, 9, 18), values[2]),
        ],
        day(2019, 9, 25),
    )
    .unwrap()
}

fn flat_rates(start: Day, end: Day, rate: f64) -> CurveAccessor<Day> {
    CurveAccessor::from(Curve::constant(start, end, rate).unwrap())
}

// ========================================
// Ratcheted Storage
// ========================================

#[test]
fn test_ratchet_storage_value_and_deltas() {
    init_tracing();
    let storage = ratchet_storage();
    let val_date = day(2019, 9, 2);
    let forwards = ratchet_series([58.89, 61.41, 59.89]);
    let rates = flat_rates(val_date, day(2019, 9, 25).offset(60), 0.03);
    let settlement = twentieth_of_next_month();
    let inputs = ValuationInputs::new(&storage, val_date, 650.0, &forwards, &rates, &settlement);
    let spot = Factor::new(14.5, ratchet_series([1.35, 1.13, 1.24]));

    let results = tree_engine(100)
        .value_with_deltas(
            &inputs,
            &spot,
            &[
                DeltaContract::Period(day(2018, 8, 28)),
                DeltaContract::Period(day(2019, 9, 15)),
            ],
        )
        .unwrap();

    assert!(results.npv.is_finite());
    assert_eq!(results.num_steps(), 23);
    assert_eq!(results.deltas.len(), 2);
    assert_eq!(results.deltas[0], 0.0);

    // Optionality on top of the intrinsic strategy
    let settings = TreeValuationSettings::builder()
        .num_inventory_grid_points(100)
        .build()
        .unwrap();
    let intrinsic = IntrinsicValuation::new(settings)
        .unwrap()
        .value(&inputs)
        .unwrap();
    assert!(intrinsic.npv > 0.0);
    assert!(results.npv >= intrinsic.npv * (1.0 - 1e-3));

    // One day's delta is the expected traded volume on that day, bounded by
    // the largest injection or withdrawal rate of the 2019-09-10 ratchet
    let max_rate = 235.8 * (1.0 + 0.0001);
    assert!(results.deltas[1].abs() <= max_rate);
}

// ========================================
// Deep In-The-Money Deltas
// ========================================

#[test]
fn test_deep_itm_withdrawal_delta_equals_intrinsic_volume() {
    init_tracing();
    let storage_start = day(2019, 12, 1);
    let storage_end = day(2020, 4, 1);
    let rate = 700.0;
    let storage = StorageModel::builder(storage_start, storage_end)
        .injection_cost(1.23)
        .withdrawal_cost(0.98)
        .min_inventory(0.0)
        .max_inventory(100_000.0)
        .max_injection_rate(rate)
        .max_withdrawal_rate(rate)
        .build()
        .unwrap();

    let val_date = day(2019, 8, 29);
    let switch_high = day(2020, 3, 12);
    let num_days_at_high_price = 20.0;
    let forwards =
        Curve::piecewise_flat(&[(val_date, 23.87), (switch_high, 150.32)], storage_end).unwrap();
    let rates = flat_rates(val_date, day(2020, 6, 1), 0.0);
    let settlement = twentieth_of_next_month();
    let inputs = ValuationInputs::new(&storage, val_date, 0.0, &forwards, &rates, &settlement);
    let spot = Factor::new(14.5, 1.15);

    let results = tree_engine(500)
        .value_with_deltas(
            &inputs,
            &spot,
            &[
                DeltaContract::Strip(storage_start, day(2020, 3, 11)),
                DeltaContract::Strip(switch_high, storage_end),
            ],
        )
        .unwrap();

    let expected = rate * num_days_at_high_price;
    assert_relative_eq!(results.deltas[1], expected, max_relative = 1e-3);
    // Everything sold at the high price is bought beforehand, mostly below
    // the forward
    assert!(results.deltas[0] < 0.0);
    assert!(results.deltas[0] > -expected * (1.0 + 1e-3));
}

// ========================================
// Optionality
// ========================================

#[test]
fn test_tree_value_at_least_intrinsic() {
    init_tracing();
    let start = day(2020, 1, 1);
    let end = day(2020, 2, 1);
    let storage = StorageModel::builder(start, end)
        .injection_cost(0.05)
        .withdrawal_cost(0.05)
        .min_inventory(0.0)
        .max_inventory(1000.0)
        .max_injection_rate(100.0)
        .max_withdrawal_rate(100.0)
        .build()
        .unwrap();
    let forwards =
        Curve::piecewise_flat(&[(start, 20.0), (day(2020, 1, 16), 22.5)], end).unwrap();
    let rates = CurveAccessor::from(0.01);
    let settlement = SettlementRule::identity();
    let inputs = ValuationInputs::new(&storage, start, 0.0, &forwards, &rates, &settlement);

    let settings = TreeValuationSettings::builder()
        .num_inventory_grid_points(11)
        .build()
        .unwrap();
    let intrinsic = IntrinsicValuation::new(settings.clone())
        .unwrap()
        .value(&inputs)
        .unwrap();
    let tree = TrinomialTreeEngine::new(settings)
        .unwrap()
        .value(&inputs, &Factor::new(12.0, 0.9))
        .unwrap();

    assert!(intrinsic.npv > 0.0);
    assert!(tree.npv >= intrinsic.npv - 1e-6);
}
