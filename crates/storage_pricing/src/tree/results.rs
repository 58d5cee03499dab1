//! Tree valuation outputs.

use serde::{Deserialize, Serialize};
use storage_core::types::TimePeriod;

/// Forward contract against which a delta is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaContract<P: TimePeriod> {
    /// Single delivery period.
    Period(P),
    /// Every delivery period from the first to the second, both inclusive.
    Strip(P, P),
}

impl<P: TimePeriod> DeltaContract<P> {
    /// First and last delivery period.
    #[inline]
    pub fn delivery(&self) -> (P, P) {
        match *self {
            Self::Period(p) => (p, p),
            Self::Strip(first, last) => (first, last),
        }
    }

    /// True if `period` is delivered under this contract.
    #[inline]
    pub fn contains(&self, period: &P) -> bool {
        let (first, last) = self.delivery();
        *period >= first && *period <= last
    }
}

/// Results of a trinomial tree valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeValuationResults<P: TimePeriod> {
    /// Value of the storage at the valuation date
    pub npv: f64,
    /// One delta per requested contract, in request order
    pub deltas: Vec<f64>,
    /// Optimal net injection (+) / withdrawal (-) on the valuation date
    pub decision: f64,
    /// Lattice periods, valuation date to storage end
    pub periods: Vec<P>,
    /// Spot price of every lattice node, per period
    pub spot_prices: Vec<Vec<f64>>,
}

impl<P: TimePeriod> TreeValuationResults<P> {
    /// Number of time steps in the lattice.
    #[inline]
    pub fn num_steps(&self) -> usize {
        self.spot_prices.len().saturating_sub(1)
    }

    /// Node spot prices on `step`.
    ///
    /// # Panics
    ///
    /// Panics if `step > num_steps()`.
    #[inline]
    pub fn spot_prices(&self, step: usize) -> &[f64] {
        &self.spot_prices[step]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_core::types::Day;

    fn day(m: u32, d: u32) -> Day {
        Day::from_ymd(2020, m, d).unwrap()
    }

    #[test]
    fn test_strip_is_inclusive() {
        let strip = DeltaContract::Strip(day(3, 12), day(4, 1));
        assert!(strip.contains(&day(3, 12)));
        assert!(strip.contains(&day(4, 1)));
        assert!(!strip.contains(&day(3, 11)));
        assert_eq!(DeltaContract::Period(day(3, 12)).delivery(), (day(3, 12), day(3, 12)));
    }

    #[test]
    fn test_results_accessors() {
        let results = TreeValuationResults {
            npv: 1.0,
            deltas: vec![],
            decision: 0.0,
            periods: vec![day(3, 1), day(3, 2)],
            spot_prices: vec![vec![10.0], vec![9.0, 10.0, 11.0]],
        };
        assert_eq!(results.num_steps(), 1);
        assert_eq!(results.spot_prices(1), &[9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let results = TreeValuationResults {
            npv: 12.5,
            deltas: vec![100.0, -50.0],
            decision: 700.0,
            periods: vec![day(3, 1)],
            spot_prices: vec![vec![10.0]],
        };
        let json = serde_json::to_string(&results).unwrap();
        let back: TreeValuationResults<Day> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, results);
    }
}
