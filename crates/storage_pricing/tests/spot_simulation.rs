//! Integration tests for multi-factor spot price simulation.

use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use storage_core::market_data::Curve;
use storage_core::types::Day;
use storage_models::models::{CorrelationMatrix, Factor, MultiFactorModel};
use storage_pricing::config::{RunControl, SimulationSettings};
use storage_pricing::simulation::MultiFactorSpotSimulator;
use storage_pricing::SimulationError;

fn day(y: i32, m: u32, d: u32) -> Day {
    Day::from_ymd(y, m, d).unwrap()
}

fn current_date() -> Day {
    day(2020, 7, 27)
}

fn sim_periods() -> [Day; 3] {
    [day(2020, 8, 1), day(2021, 1, 15), day(2021, 7, 30)]
}

/// Piecewise-flat curve through the three simulated periods.
fn curve(values: [f64; 3]) -> Curve<Day> {
    let [first, second, third] = sim_periods();
    Curve::piecewise_flat(
        &[(first, values[0]), (second, values[1]), (third, values[2])],
        third,
    )
    .unwrap()
}

fn three_factor_model() -> MultiFactorModel<Day> {
    MultiFactorModel::new(
        vec![
            Factor::new(0.0, curve([0.35, 0.29, 0.32])),
            Factor::new(2.5, curve([0.15, 0.18, 0.21])),
            Factor::new(16.2, curve([0.95, 0.92, 0.89])),
        ],
        CorrelationMatrix::from_rows(&[
            vec![1.0, 0.6, 0.3],
            vec![0.6, 1.0, 0.4],
            vec![0.3, 0.4, 1.0],
        ])
        .unwrap(),
    )
    .unwrap()
}

fn forwards() -> Curve<Day> {
    curve([56.85, 59.08, 62.453])
}

fn simulator(seed: u64, antithetic: bool) -> MultiFactorSpotSimulator<Day> {
    let settings = SimulationSettings::builder()
        .seed(seed)
        .antithetic(antithetic)
        .build()
        .unwrap();
    MultiFactorSpotSimulator::new(
        three_factor_model(),
        current_date(),
        &forwards(),
        &sim_periods(),
        settings,
    )
    .unwrap()
}

// ========================================
// Reproducibility
// ========================================

#[test]
fn test_same_seed_reproduces_prices() {
    let first = simulator(12, false).simulate(4).unwrap();
    let second = simulator(12, false).simulate(4).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.num_periods(), 3);
    assert!(first.prices().iter().all(|p| p.is_finite() && *p > 0.0));

    let other = simulator(13, false).simulate(4).unwrap();
    assert_ne!(first.prices(), other.prices());
}

#[test]
fn test_scenarios_independent_of_run_size() {
    let small = simulator(12, false).simulate(4).unwrap();
    let large = simulator(12, false).simulate(1000).unwrap();
    for sim in 0..4 {
        assert_eq!(small.scenario(sim), large.scenario(sim));
    }
}

#[test]
fn test_antithetic_pairs_share_normals() {
    let result = simulator(12, true).simulate(10).unwrap();
    for pair in 0..5 {
        for period in 0..3 {
            for factor in 0..3 {
                assert_eq!(
                    result.factor_state(2 * pair, period, factor),
                    -result.factor_state(2 * pair + 1, period, factor)
                );
            }
        }
    }
}

// ========================================
// Distribution
// ========================================

#[test]
fn test_sample_means_match_forwards() {
    let result = simulator(7, true).simulate(50_000).unwrap();
    let expected = [56.85, 59.08, 62.453];
    for (mean, forward) in result.means().iter().zip(expected) {
        assert_relative_eq!(*mean, forward, max_relative = 0.01);
    }
}

// ========================================
// Inputs and Control
// ========================================

#[test]
fn test_period_before_current_date_rejected() {
    let result = MultiFactorSpotSimulator::new(
        three_factor_model(),
        day(2020, 8, 2),
        &forwards(),
        &sim_periods(),
        SimulationSettings::default(),
    );
    assert!(matches!(
        result,
        Err(SimulationError::PeriodBeforeCurrentDate { .. })
    ));
}

#[test]
fn test_progress_reaches_completion() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let result = simulator(12, false)
        .with_control(RunControl::new().with_progress(move |p| sink.lock().unwrap().push(p)))
        .simulate(500)
        .unwrap();
    assert_eq!(result.num_sims(), 500);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.last(), Some(&1.0));
}

#[test]
fn test_csv_export_readable() {
    let result = simulator(12, false).simulate(3).unwrap();
    let mut buffer = Vec::new();
    result.write_csv(&mut buffer).unwrap();

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["simulation", "2020-08-01", "2021-01-15", "2021-07-30"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    let parsed: f64 = rows[1][2].parse().unwrap();
    assert_eq!(parsed, result.price(1, 1));
}
