//! Mean-reverting trinomial lattice in log-price space.
//!
//! The log spot price is `ln S(t) = x(t) + a(t)` where `x` follows a
//! zero-mean Ornstein–Uhlenbeck process
//!
//! ```text
//! dx = -κ x dt + σ(t) dW
//! ```
//!
//! and the deterministic shift `a(t)` is chosen at every level so that the
//! expected spot price equals the forward price for that period.
//!
//! Level `m + 1` is spaced at `Δx = sqrt(3 V_m)`, with `V_m` the exact
//! one-step variance of `x`. From node `j` at level `m` the expected value
//! `M = j Δx_m exp(-κ Δt)` is bracketed by the child nodes
//! `k - 1, k, k + 1` with `k = round(M / Δx_{m+1})`, and the branch
//! probabilities match the first two moments of `x` exactly.
//!
//! The geometry (node spacing, branching, state prices) depends only on the
//! volatility, mean reversion and time step. Forward prices enter only
//! through the per-level shift, so bumped forward curves reuse the same
//! geometry.

use crate::error::ValuationError;

/// Branches from one node to the next level: down, middle, up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Child node indices (down, middle, up) within the next level
    pub children: [usize; 3],
    /// Branch probabilities (down, middle, up)
    pub probabilities: [f64; 3],
}

impl Transition {
    /// Single certain branch, used for deterministic price paths.
    #[inline]
    pub fn certain(child: usize) -> Self {
        Self {
            children: [child; 3],
            probabilities: [0.0, 1.0, 0.0],
        }
    }
}

#[derive(Debug, Clone)]
struct Level {
    dx: f64,
    min_index: i64,
    num_nodes: usize,
    /// Σ_j Q_j exp(x_j), with Q the Arrow-Debreu state probabilities
    normaliser: f64,
}

/// Price-independent trinomial lattice geometry.
///
/// # Examples
///
/// ```rust
/// use storage_pricing::tree::TrinomialLattice;
///
/// let lattice = TrinomialLattice::build(&[1.15; 10], 14.5, 1.0 / 365.0).unwrap();
/// assert_eq!(lattice.num_steps(), 10);
///
/// let forwards = vec![23.87; 11];
/// let prices = lattice.price_levels(&forwards).unwrap();
/// assert_eq!(prices.len(), 11);
/// assert_eq!(prices[0], vec![23.87]);
/// ```
#[derive(Debug, Clone)]
pub struct TrinomialLattice {
    time_step: f64,
    mean_reversion: f64,
    levels: Vec<Level>,
    transitions: Vec<Vec<Transition>>,
}

impl TrinomialLattice {
    /// Build the lattice for `step_vols.len()` steps, where `step_vols[m]` is
    /// the spot volatility over the step from level `m` to `m + 1`.
    ///
    /// # Errors
    ///
    /// - `Config` if `time_step` is not positive and finite
    /// - `InvalidMeanReversion` if `mean_reversion` is negative or non-finite
    /// - `InvalidVolatility` if a volatility is not positive and finite
    pub fn build(
        step_vols: &[f64],
        mean_reversion: f64,
        time_step: f64,
    ) -> Result<Self, ValuationError> {
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(crate::config::ConfigError::InvalidParameter {
                name: "time_step",
                value: format!("must be positive and finite, got {}", time_step),
            }
            .into());
        }
        if !(mean_reversion.is_finite() && mean_reversion >= 0.0) {
            return Err(ValuationError::InvalidMeanReversion(mean_reversion));
        }
        if let Some((step, &vol)) = step_vols
            .iter()
            .enumerate()
            .find(|(_, v)| !(v.is_finite() && **v > 0.0))
        {
            return Err(ValuationError::InvalidVolatility {
                period: format!("step {}", step),
                value: vol,
            });
        }

        let decay = (-mean_reversion * time_step).exp();
        let variance_factor = if mean_reversion > 0.0 {
            -(-2.0 * mean_reversion * time_step).exp_m1() / (2.0 * mean_reversion)
        } else {
            time_step
        };
        let spacing = |vol: f64| (3.0 * vol * vol * variance_factor).sqrt();

        let num_steps = step_vols.len();
        let mut levels = Vec::with_capacity(num_steps + 1);
        let mut transitions = Vec::with_capacity(num_steps);
        levels.push(Level {
            dx: step_vols.first().map_or(0.0, |&v| spacing(v)),
            min_index: 0,
            num_nodes: 1,
            normaliser: 1.0,
        });

        for &vol in step_vols {
            let current = &levels[levels.len() - 1];
            let dx_next = spacing(vol);

            let centres: Vec<(i64, f64)> = (0..current.num_nodes)
                .map(|node| {
                    let x = (current.min_index + node as i64) as f64 * current.dx;
                    let mean = x * decay;
                    let k = (mean / dx_next).round();
                    (k as i64, (mean - k * dx_next) / dx_next)
                })
                .collect();

            // Centres are non-decreasing in the node index
            let next_min = centres[0].0 - 1;
            let next_max = centres[centres.len() - 1].0 + 1;

            let step_transitions: Vec<Transition> = centres
                .iter()
                .map(|&(k, alpha)| {
                    let mid = (k - next_min) as usize;
                    let alpha_sq = alpha * alpha;
                    Transition {
                        children: [mid - 1, mid, mid + 1],
                        probabilities: [
                            1.0 / 6.0 + (alpha_sq - alpha) / 2.0,
                            2.0 / 3.0 - alpha_sq,
                            1.0 / 6.0 + (alpha_sq + alpha) / 2.0,
                        ],
                    }
                })
                .collect();

            transitions.push(step_transitions);
            levels.push(Level {
                dx: dx_next,
                min_index: next_min,
                num_nodes: (next_max - next_min + 1) as usize,
                normaliser: 0.0,
            });
        }

        // Forward induction of Arrow-Debreu probabilities
        let mut state_probs = vec![1.0];
        for (m, step_transitions) in transitions.iter().enumerate() {
            let mut next_probs = vec![0.0; levels[m + 1].num_nodes];
            for (q, transition) in state_probs.iter().zip(step_transitions) {
                for (&child, &p) in transition.children.iter().zip(&transition.probabilities) {
                    next_probs[child] += q * p;
                }
            }
            let next = &mut levels[m + 1];
            next.normaliser = next_probs
                .iter()
                .enumerate()
                .map(|(node, q)| q * ((next.min_index + node as i64) as f64 * next.dx).exp())
                .sum();
            state_probs = next_probs;
        }

        Ok(Self {
            time_step,
            mean_reversion,
            levels,
            transitions,
        })
    }

    /// Number of time steps (levels minus one).
    #[inline]
    pub fn num_steps(&self) -> usize {
        self.transitions.len()
    }

    /// Time step in years.
    #[inline]
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Mean reversion rate.
    #[inline]
    pub fn mean_reversion(&self) -> f64 {
        self.mean_reversion
    }

    /// Number of nodes at `level`.
    #[inline]
    pub fn num_nodes(&self, level: usize) -> usize {
        self.levels[level].num_nodes
    }

    /// Branches from each node of `level` into `level + 1`.
    #[inline]
    pub fn transitions(&self, level: usize) -> &[Transition] {
        &self.transitions[level]
    }

    /// All transitions, one vector per step.
    #[inline]
    pub fn all_transitions(&self) -> &[Vec<Transition>] {
        &self.transitions
    }

    /// Spot prices per level anchored to `forwards`, one forward per level.
    ///
    /// The probability-weighted price at every level equals its forward.
    ///
    /// # Errors
    ///
    /// `Config` if the forward count does not equal the number of levels.
    pub fn price_levels(&self, forwards: &[f64]) -> Result<Vec<Vec<f64>>, ValuationError> {
        if forwards.len() != self.levels.len() {
            return Err(crate::config::ConfigError::InvalidParameter {
                name: "forwards",
                value: format!(
                    "expected {} forward prices, got {}",
                    self.levels.len(),
                    forwards.len()
                ),
            }
            .into());
        }
        Ok(self
            .levels
            .iter()
            .zip(forwards)
            .map(|(level, &forward)| {
                let scale = forward / level.normaliser;
                (0..level.num_nodes)
                    .map(|node| scale * ((level.min_index + node as i64) as f64 * level.dx).exp())
                    .collect()
            })
            .collect())
    }

    /// Arrow-Debreu probabilities of reaching each node, per level.
    pub fn state_probabilities(&self) -> Vec<Vec<f64>> {
        let mut out = Vec::with_capacity(self.levels.len());
        out.push(vec![1.0]);
        for (m, step_transitions) in self.transitions.iter().enumerate() {
            let mut next = vec![0.0; self.levels[m + 1].num_nodes];
            for (q, transition) in out[m].iter().zip(step_transitions) {
                for (&child, &p) in transition.children.iter().zip(&transition.probabilities) {
                    next[child] += q * p;
                }
            }
            out.push(next);
        }
        out
    }
}
