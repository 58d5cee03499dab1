//! Exact simulation of correlated Ornstein–Uhlenbeck factors.
//!
//! Each factor state `Z_i` starts at zero on the current date and follows
//! `dZ_i = -α_i Z_i dt + dW_i` with `dW_i dW_j = ρ_ij dt`. Between two
//! simulated periods `Δ` apart the transition is exact:
//!
//! ```text
//! Z_i(t + Δ) = exp(-α_i Δ) Z_i(t) + ε_i
//! Cov(ε_i, ε_j) = ρ_ij (1 - exp(-(α_i + α_j) Δ)) / (α_i + α_j)
//! ```
//!
//! The spot price for delivery `T` is
//!
//! ```text
//! ln S(T) = ln F(T) - ½ Var[X(T)] + X(T),   X(T) = Σ_i σ_i(T) Z_i(T)
//! ```
//!
//! so that `E[S(T)] = F(T)`.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use storage_core::market_data::Curve;
use storage_core::types::{year_fraction, TimePeriod};
use storage_models::models::{psd_cholesky, CholeskyFactor, MultiFactorModel};
use tracing::{debug, info};

use super::result::SimulationResult;
use crate::config::{ConfigError, RunControl, SimulationSettings};
use crate::error::SimulationError;
use crate::rng::ScenarioRng;

/// Number of progress reports per run.
const PROGRESS_REPORTS: usize = 100;

/// Simulates spot prices for a fixed set of delivery periods.
///
/// All period-dependent quantities (forwards, drift corrections, factor
/// volatilities, step covariance factors) are computed on construction.
/// Simulation output depends only on those and the seed: scenario `k` draws
/// from its own stream derived from `(seed, k)`, so results do not depend on
/// thread scheduling.
///
/// # Examples
///
/// ```rust
/// use storage_core::market_data::Curve;
/// use storage_core::types::Day;
/// use storage_models::models::{Factor, MultiFactorModel};
/// use storage_pricing::config::SimulationSettings;
/// use storage_pricing::simulation::MultiFactorSpotSimulator;
///
/// let current = Day::from_ymd(2020, 7, 27).unwrap();
/// let delivery = Day::from_ymd(2020, 8, 1).unwrap();
/// let model = MultiFactorModel::with_scalar_correlation(
///     Factor::new(0.0, 0.35),
///     Factor::new(2.5, 0.15),
///     0.6,
/// )
/// .unwrap();
/// let forwards = Curve::constant(delivery, delivery, 56.85).unwrap();
/// let settings = SimulationSettings::builder().seed(12).build().unwrap();
///
/// let simulator =
///     MultiFactorSpotSimulator::new(model, current, &forwards, &[delivery], settings).unwrap();
/// let result = simulator.simulate(100).unwrap();
/// assert_eq!(result.num_sims(), 100);
/// assert_eq!(result.num_periods(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MultiFactorSpotSimulator<P: TimePeriod> {
    model: MultiFactorModel<P>,
    current_date: P,
    periods: Vec<P>,
    log_drifts: Vec<f64>,
    /// Factor volatilities, `periods x factors`
    vols: Vec<f64>,
    /// State decay per step, `periods x factors`
    decays: Vec<f64>,
    step_factors: Vec<CholeskyFactor>,
    settings: SimulationSettings,
    control: RunControl,
}

impl<P: TimePeriod> MultiFactorSpotSimulator<P> {
    /// Prepare a simulator for `sim_periods` (sorted and deduplicated).
    ///
    /// # Errors
    ///
    /// - `Config` for invalid settings
    /// - `PeriodBeforeCurrentDate` if a period precedes `current_date`
    /// - `Curve` / `Model` if a forward price or factor volatility is missing
    /// - `InvalidForwardPrice` for a non-positive forward price
    /// - `Correlation` if a step covariance is not positive semi-definite
    pub fn new(
        model: MultiFactorModel<P>,
        current_date: P,
        forward_curve: &Curve<P>,
        sim_periods: &[P],
        settings: SimulationSettings,
    ) -> Result<Self, SimulationError> {
        settings.validate()?;
        let periods: Vec<P> = sim_periods
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if let Some(first) = periods.first().filter(|p| **p < current_date) {
            return Err(SimulationError::PeriodBeforeCurrentDate {
                period: first.to_string(),
                current_date: current_date.to_string(),
            });
        }

        let num_factors = model.num_factors();
        let mut log_drifts = Vec::with_capacity(periods.len());
        let mut vols = Vec::with_capacity(periods.len() * num_factors);
        let mut decays = Vec::with_capacity(periods.len() * num_factors);
        let mut step_factors = Vec::with_capacity(periods.len());
        let mut covariance = vec![0.0; num_factors * num_factors];

        let mut previous = current_date;
        for period in &periods {
            let forward = forward_curve.get(period)?;
            if !(forward.is_finite() && forward > 0.0) {
                return Err(SimulationError::InvalidForwardPrice {
                    period: period.to_string(),
                    value: forward,
                });
            }
            let variance = model.integrated_variance(&current_date, period, period)?;
            log_drifts.push(forward.ln() - 0.5 * variance);

            for factor in model.factors() {
                vols.push(factor.vol_at(period)?);
            }

            let dt = year_fraction(&previous, period);
            for (i, fi) in model.factors().iter().enumerate() {
                decays.push((-fi.mean_reversion * dt).exp());
                for (j, fj) in model.factors().iter().enumerate() {
                    let a = fi.mean_reversion + fj.mean_reversion;
                    let integral = if a == 0.0 {
                        dt
                    } else {
                        -(-a * dt).exp_m1() / a
                    };
                    covariance[i * num_factors + j] = model.correlation().get(i, j) * integral;
                }
            }
            step_factors.push(psd_cholesky(&covariance, num_factors)?);
            previous = *period;
        }

        debug!(
            num_periods = periods.len(),
            num_factors, "Prepared multi-factor spot simulator"
        );

        Ok(Self {
            model,
            current_date,
            periods,
            log_drifts,
            vols,
            decays,
            step_factors,
            settings,
            control: RunControl::new(),
        })
    }

    /// Attach cancellation and progress reporting.
    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    /// Simulated delivery periods in ascending order.
    #[inline]
    pub fn periods(&self) -> &[P] {
        &self.periods
    }

    /// Current (valuation) date.
    #[inline]
    pub fn current_date(&self) -> P {
        self.current_date
    }

    /// Factor model.
    #[inline]
    pub fn model(&self) -> &MultiFactorModel<P> {
        &self.model
    }

    /// Settings in use.
    #[inline]
    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Simulate the configured number of scenarios.
    pub fn run(&self) -> Result<SimulationResult<P>, SimulationError> {
        self.simulate(self.settings.num_sims())
    }

    /// Simulate `num_sims` scenarios.
    ///
    /// With antithetic pairing, scenario `2k + 1` uses the negated draws of
    /// scenario `2k`.
    ///
    /// # Errors
    ///
    /// - `Config` if `num_sims` is zero
    /// - `Cancelled` if the run is cancelled
    pub fn simulate(&self, num_sims: usize) -> Result<SimulationResult<P>, SimulationError> {
        if num_sims == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "num_sims",
                value: "must be at least 1, got 0".to_string(),
            }
            .into());
        }
        let started = Instant::now();
        let num_periods = self.periods.len();
        let num_factors = self.model.num_factors();
        let seed = self.settings.seed();
        let antithetic = self.settings.antithetic();
        info!(
            num_sims,
            num_periods,
            num_factors,
            seed,
            antithetic,
            "Starting multi-factor spot simulation"
        );

        let mut prices = vec![0.0; num_sims * num_periods];
        let mut states = vec![0.0; num_sims * num_periods * num_factors];
        let completed = AtomicUsize::new(0);
        let report_every = (num_sims / PROGRESS_REPORTS).max(1);

        if num_periods > 0 {
            prices
                .par_chunks_mut(num_periods)
                .zip(states.par_chunks_mut(num_periods * num_factors))
                .enumerate()
                .try_for_each(|(scenario, (scenario_prices, scenario_states))| {
                    if self.control.is_cancelled() {
                        return Err(SimulationError::Cancelled);
                    }
                    let (stream, negate) = if antithetic {
                        (scenario / 2, scenario % 2 == 1)
                    } else {
                        (scenario, false)
                    };
                    self.simulate_scenario(
                        stream as u64,
                        negate,
                        scenario_prices,
                        scenario_states,
                    );
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % report_every == 0 {
                        self.control.report(done as f64 / num_sims as f64);
                    }
                    Ok(())
                })?;
        }
        self.control.report(1.0);

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Multi-factor spot simulation complete"
        );
        Ok(SimulationResult::new(
            self.periods.clone(),
            num_sims,
            num_factors,
            prices,
            states,
        ))
    }

    fn simulate_scenario(&self, stream: u64, negate: bool, prices: &mut [f64], states: &mut [f64]) {
        let n = self.model.num_factors();
        let mut rng = ScenarioRng::for_stream(self.settings.seed(), stream);
        let mut normals = vec![0.0; n];
        let mut shocks = vec![0.0; n];
        let mut z = vec![0.0; n];

        for (k, price) in prices.iter_mut().enumerate() {
            rng.fill_normal(&mut normals);
            if negate {
                normals.iter_mut().for_each(|x| *x = -*x);
            }
            self.step_factors[k].transform_into(&normals, &mut shocks);

            let decays = &self.decays[k * n..(k + 1) * n];
            let vols = &self.vols[k * n..(k + 1) * n];
            let mut log_price = self.log_drifts[k];
            for i in 0..n {
                z[i] = decays[i] * z[i] + shocks[i];
                log_price += vols[i] * z[i];
            }
            states[k * n..(k + 1) * n].copy_from_slice(&z);
            *price = log_price.exp();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CancellationToken;
    use approx::assert_relative_eq;
    use storage_core::types::Day;
    use storage_models::models::{CorrelationMatrix, Factor};

    fn day(y: i32, m: u32, d: u32) -> Day {
        Day::from_ymd(y, m, d).unwrap()
    }

    fn one_factor(mean_reversion: f64, vol: f64) -> MultiFactorModel<Day> {
        MultiFactorModel::one_factor(Factor::new(mean_reversion, vol)).unwrap()
    }

    fn settings(seed: u64, antithetic: bool) -> SimulationSettings {
        SimulationSettings::builder()
            .seed(seed)
            .antithetic(antithetic)
            .build()
            .unwrap()
    }

    #[test]
    fn test_periods_sorted_and_deduplicated() {
        let forwards = Curve::constant(day(2020, 8, 1), day(2020, 8, 31), 50.0).unwrap();
        let simulator = MultiFactorSpotSimulator::new(
            one_factor(1.0, 0.3),
            day(2020, 7, 27),
            &forwards,
            &[day(2020, 8, 20), day(2020, 8, 1), day(2020, 8, 20)],
            settings(1, false),
        )
        .unwrap();
        assert_eq!(simulator.periods(), &[day(2020, 8, 1), day(2020, 8, 20)]);
    }

    #[test]
    fn test_period_before_current_date_rejected() {
        let forwards = Curve::constant(day(2020, 7, 1), day(2020, 8, 31), 50.0).unwrap();
        let result = MultiFactorSpotSimulator::new(
            one_factor(1.0, 0.3),
            day(2020, 7, 27),
            &forwards,
            &[day(2020, 7, 20), day(2020, 8, 1)],
            settings(1, false),
        );
        assert!(matches!(
            result,
            Err(SimulationError::PeriodBeforeCurrentDate { .. })
        ));
    }

    #[test]
    fn test_missing_forward_rejected() {
        let forwards = Curve::constant(day(2020, 8, 1), day(2020, 8, 10), 50.0).unwrap();
        let result = MultiFactorSpotSimulator::new(
            one_factor(1.0, 0.3),
            day(2020, 7, 27),
            &forwards,
            &[day(2020, 8, 20)],
            settings(1, false),
        );
        assert!(matches!(result, Err(SimulationError::Curve(_))));
    }

    #[test]
    fn test_current_date_prices_equal_forward() {
        let forwards = Curve::constant(day(2020, 7, 27), day(2020, 8, 31), 50.0).unwrap();
        let simulator = MultiFactorSpotSimulator::new(
            one_factor(1.0, 0.3),
            day(2020, 7, 27),
            &forwards,
            &[day(2020, 7, 27)],
            settings(1, false),
        )
        .unwrap();
        let result = simulator.simulate(10).unwrap();
        for sim in 0..10 {
            assert_relative_eq!(result.price(sim, 0), 50.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_antithetic_pairs_mirror_states() {
        let forwards = Curve::constant(day(2020, 8, 1), day(2020, 8, 31), 50.0).unwrap();
        let model = MultiFactorModel::new(
            vec![Factor::new(0.0, 0.3), Factor::new(5.0, 0.8)],
            CorrelationMatrix::two_factor(0.4).unwrap(),
        )
        .unwrap();
        let simulator = MultiFactorSpotSimulator::new(
            model,
            day(2020, 7, 27),
            &forwards,
            &[day(2020, 8, 1), day(2020, 8, 15), day(2020, 8, 31)],
            settings(7, true),
        )
        .unwrap();
        let result = simulator.simulate(6).unwrap();
        for pair in 0..3 {
            for period in 0..3 {
                for factor in 0..2 {
                    assert_eq!(
                        result.factor_state(2 * pair, period, factor),
                        -result.factor_state(2 * pair + 1, period, factor)
                    );
                }
            }
        }
    }

    #[test]
    fn test_sample_mean_close_to_forward() {
        let forwards = Curve::constant(day(2020, 8, 1), day(2020, 12, 31), 40.0).unwrap();
        let simulator = MultiFactorSpotSimulator::new(
            one_factor(3.0, 0.4),
            day(2020, 7, 27),
            &forwards,
            &[day(2020, 9, 1), day(2020, 12, 31)],
            settings(42, true),
        )
        .unwrap();
        let result = simulator.simulate(20_000).unwrap();
        for mean in result.means() {
            assert_relative_eq!(mean, 40.0, max_relative = 0.01);
        }
    }

    #[test]
    fn test_fast_mean_reversion_distant_period_prices_finite() {
        let forwards = Curve::constant(day(2020, 1, 1), day(2028, 1, 1), 50.0).unwrap();
        let simulator = MultiFactorSpotSimulator::new(
            one_factor(45.0, 0.8),
            day(2020, 1, 1),
            &forwards,
            &[day(2027, 12, 31), day(2028, 1, 1)],
            settings(11, true),
        )
        .unwrap();
        let result = simulator.simulate(2_000).unwrap();
        assert!(result.prices().iter().all(|p| p.is_finite() && *p > 0.0));
        for mean in result.means() {
            assert_relative_eq!(mean, 50.0, max_relative = 0.01);
        }
    }

    #[test]
    fn test_zero_sims_rejected() {
        let forwards = Curve::constant(day(2020, 8, 1), day(2020, 8, 31), 50.0).unwrap();
        let simulator = MultiFactorSpotSimulator::new(
            one_factor(1.0, 0.3),
            day(2020, 7, 27),
            &forwards,
            &[day(2020, 8, 1)],
            settings(1, false),
        )
        .unwrap();
        assert!(matches!(
            simulator.simulate(0),
            Err(SimulationError::Config(_))
        ));
    }

    #[test]
    fn test_cancelled_simulation() {
        let forwards = Curve::constant(day(2020, 8, 1), day(2020, 8, 31), 50.0).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let simulator = MultiFactorSpotSimulator::new(
            one_factor(1.0, 0.3),
            day(2020, 7, 27),
            &forwards,
            &[day(2020, 8, 1)],
            settings(1, false),
        )
        .unwrap()
        .with_control(RunControl::new().with_cancellation(token));
        assert_eq!(simulator.run().unwrap_err(), SimulationError::Cancelled);
    }
}
