//! Simulated spot price matrix.

use std::collections::BTreeMap;
use std::io::Write;

use storage_core::types::TimePeriod;

use crate::error::ExportError;

/// Spot prices and factor states for every scenario and simulated period.
///
/// Prices are stored row-major (`scenario x period`); factor states as
/// `scenario x period x factor`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult<P: TimePeriod> {
    periods: Vec<P>,
    num_sims: usize,
    num_factors: usize,
    prices: Vec<f64>,
    factor_states: Vec<f64>,
}

impl<P: TimePeriod> SimulationResult<P> {
    pub(crate) fn new(
        periods: Vec<P>,
        num_sims: usize,
        num_factors: usize,
        prices: Vec<f64>,
        factor_states: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(prices.len(), num_sims * periods.len());
        debug_assert_eq!(factor_states.len(), prices.len() * num_factors);
        Self {
            periods,
            num_sims,
            num_factors,
            prices,
            factor_states,
        }
    }

    /// Simulated periods in ascending order.
    #[inline]
    pub fn periods(&self) -> &[P] {
        &self.periods
    }

    /// Number of scenarios.
    #[inline]
    pub fn num_sims(&self) -> usize {
        self.num_sims
    }

    /// Number of simulated periods.
    #[inline]
    pub fn num_periods(&self) -> usize {
        self.periods.len()
    }

    /// Number of model factors.
    #[inline]
    pub fn num_factors(&self) -> usize {
        self.num_factors
    }

    /// All prices, row-major.
    #[inline]
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Price of scenario `sim` for the period at `period_index`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn price(&self, sim: usize, period_index: usize) -> f64 {
        assert!(period_index < self.periods.len(), "period index out of range");
        self.prices[sim * self.periods.len() + period_index]
    }

    /// Price path of scenario `sim`.
    #[inline]
    pub fn scenario(&self, sim: usize) -> &[f64] {
        let n = self.periods.len();
        &self.prices[sim * n..(sim + 1) * n]
    }

    /// Price path of scenario `sim` keyed by period.
    pub fn scenario_map(&self, sim: usize) -> BTreeMap<P, f64> {
        self.periods
            .iter()
            .copied()
            .zip(self.scenario(sim).iter().copied())
            .collect()
    }

    /// Prices of every scenario for `period`, or `None` if it was not simulated.
    pub fn column(&self, period: &P) -> Option<Vec<f64>> {
        let index = self.periods.binary_search(period).ok()?;
        let n = self.periods.len();
        Some(
            (0..self.num_sims)
                .map(|sim| self.prices[sim * n + index])
                .collect(),
        )
    }

    /// Sample mean price per period.
    pub fn means(&self) -> Vec<f64> {
        let n = self.periods.len();
        let mut sums = vec![0.0; n];
        for row in self.prices.chunks_exact(n.max(1)) {
            for (sum, price) in sums.iter_mut().zip(row) {
                *sum += price;
            }
        }
        sums.iter().map(|s| s / self.num_sims as f64).collect()
    }

    /// State of `factor` in scenario `sim` at the period at `period_index`.
    #[inline]
    pub fn factor_state(&self, sim: usize, period_index: usize, factor: usize) -> f64 {
        assert!(factor < self.num_factors, "factor index out of range");
        let n = self.periods.len();
        self.factor_states[(sim * n + period_index) * self.num_factors + factor]
    }

    /// States of `factor` as a `scenario x period` row-major matrix.
    pub fn factor_matrix(&self, factor: usize) -> Vec<f64> {
        assert!(factor < self.num_factors, "factor index out of range");
        self.factor_states
            .iter()
            .skip(factor)
            .step_by(self.num_factors)
            .copied()
            .collect()
    }

    /// Write prices as CSV: a `simulation` column followed by one column per
    /// period, one row per scenario.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if writing fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        let mut header = Vec::with_capacity(self.periods.len() + 1);
        header.push("simulation".to_string());
        header.extend(self.periods.iter().map(ToString::to_string));
        csv.write_record(&header)?;

        for sim in 0..self.num_sims {
            let mut record = Vec::with_capacity(self.periods.len() + 1);
            record.push(sim.to_string());
            record.extend(self.scenario(sim).iter().map(ToString::to_string));
            csv.write_record(&record)?;
        }
        csv.flush()?;
        Ok(())
    }
}
