//! Integration tests for intrinsic storage valuation.

use storage_core::market_data::{Curve, CurveAccessor};
use storage_core::types::{Day, TimePeriod};
use storage_models::storage::{Ratchet, RatchetInterp, RatchetPillar, StorageModel};
use storage_pricing::config::TreeValuationSettings;
use storage_pricing::intrinsic::IntrinsicValuation;
use storage_pricing::valuation::{SettlementRule, ValuationInputs};

fn day(m: u32, d: u32) -> Day {
    Day::from_ymd(2019, m, d).unwrap()
}

fn storage_end() -> Day {
    day(9, 25)
}

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

fn engine() -> IntrinsicValuation {
    let settings = TreeValuationSettings::builder()
        .num_inventory_grid_points(100)
        .build()
        .unwrap();
    IntrinsicValuation::new(settings).unwrap()
}

fn simple_storage() -> StorageModel<Day> {
    StorageModel::builder(day(8, 28), storage_end())
        .injection_cost(0.1)
        .withdrawal_cost(0.2)
        .min_inventory(0.0)
        .max_inventory(1000.0)
        .max_injection_rate(2.5)
        .max_withdrawal_rate(3.6)
        .build()
        .unwrap()
}

fn simple_forwards() -> Curve<Day> {
    Curve::piecewise_flat(
        &[(day(8, 28), 58.89), (day(9, 12), 61.41), (day(9, 18), 70.89)],
        storage_end(),
    )
    .unwrap()
}

fn rates_from(start: Day) -> CurveAccessor<Day> {
    CurveAccessor::from(Curve::constant(start, storage_end().offset(60), 0.03).unwrap())
}

// ========================================
// Ratcheted Storage
// ========================================

#[test]
fn test_ratchet_storage_profile() {
    let storage = StorageModel::builder(day(8, 28), storage_end())
        .injection_cost(0.015)
        .withdrawal_cost(0.02)
        .cmdty_consumed_inject(0.0001)
        .cmdty_consumed_withdraw(0.000088)
        .inventory_loss(0.001)
        .inventory_cost(0.002)
        .ratchets(vec![
            Ratchet::new(
                day(8, 28),
                vec![
                    RatchetPillar::new(0.0, -150.0, 255.2),
                    RatchetPillar::new(2000.0, -200.0, 175.0),
                ],
            ),
            Ratchet::new(
                day(9, 10),
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
        .unwrap();

    let val_date = day(9, 2);
    let forwards = Curve::piecewise_flat(
        &[(val_date, 58.89), (day(9, 12), 61.41), (day(9, 18), 59.89)],
        storage_end(),
    )
    .unwrap();
    let rates = rates_from(val_date);
    let settlement = twentieth_of_next_month();
    let inputs = ValuationInputs::new(&storage, val_date, 650.0, &forwards, &rates, &settlement);

    let results = engine().value(&inputs).unwrap();

    assert!(results.npv.is_finite());
    assert_eq!(results.profile.len(), 24);
    assert_eq!(results.profile.entries()[0].period, val_date);
    assert_eq!(results.profile.entries()[23].period, storage_end());
    for entry in results.profile.iter() {
        assert!(entry.inventory >= -1e-9);
        assert!(entry.inventory <= 2000.0 + 1e-9);
    }
    let total: f64 = results.profile.iter().map(|e| e.period_pv).sum();
    assert!((total - results.npv).abs() < 1e-9 * results.npv.abs().max(1.0));
}

// ========================================
// Valuation Date Edge Cases
// ========================================

#[test]
fn test_expired_storage_zero_npv_empty_profile() {
    let storage = simple_storage();
    let val_date = day(9, 26);
    let forwards = simple_forwards();
    let rates = rates_from(val_date);
    let settlement = twentieth_of_next_month();
    let inputs = ValuationInputs::new(&storage, val_date, 0.0, &forwards, &rates, &settlement);

    let results = engine().value(&inputs).unwrap();
    assert_eq!(results.npv, 0.0);
    assert!(results.profile.is_empty());
}

#[test]
fn test_valuation_on_storage_end_zero_npv_empty_profile() {
    let storage = simple_storage();
    let val_date = storage_end();
    let forwards = simple_forwards();
    let rates = rates_from(val_date);
    let settlement = twentieth_of_next_month();
    let inputs = ValuationInputs::new(&storage, val_date, 0.0, &forwards, &rates, &settlement);

    let results = engine().value(&inputs).unwrap();
    assert_eq!(results.npv, 0.0);
    assert!(results.profile.is_empty());
}
