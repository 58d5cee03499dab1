//! Multi-factor mean-reverting forward price dynamics.
//!
//! Each factor `i` has a mean reversion rate `α_i` and a volatility
//! `σ_i(T)` indexed by delivery period. The forward price for delivery `T`
//! evolves as
//!
//! ```text
//! dF(t, T) / F(t, T) = Σ_i σ_i(T) exp(-α_i (T - t)) dW_i(t)
//! ```
//!
//! with `dW_i dW_j = ρ_ij dt`. Integrated covariances of log forward returns
//! over an observation window have a closed form, exposed here for
//! diagnostics and calibration checks. The spot simulator uses the same
//! factor definitions.

use std::f64::consts::PI;

use chrono::Datelike;
use storage_core::market_data::{Curve, CurveAccessor, CurveError};
use storage_core::types::{year_fraction, TimePeriod};
use thiserror::Error;

use super::correlation::{CorrelationError, CorrelationMatrix};

/// Day count used to phase the seasonal factor.
const SEASONAL_DAYS_PER_YEAR: f64 = 365.25;

/// Errors from multi-factor model construction and analytics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// No factors were supplied.
    #[error("At least one factor must be provided")]
    NoFactors,

    /// Factor count and correlation matrix dimension differ.
    #[error("Number of factors ({factors}) does not match correlation dimension ({correlation_dim})")]
    DimensionMismatch {
        /// Number of factors
        factors: usize,
        /// Correlation matrix dimension
        correlation_dim: usize,
    },

    /// A mean reversion rate is negative or non-finite.
    #[error("Factor {index} mean reversion must be finite and non-negative: got {value}")]
    InvalidMeanReversion {
        /// Factor index
        index: usize,
        /// Supplied value
        value: f64,
    },

    /// Observation end precedes observation start.
    #[error("Observation end {end} precedes observation start {start}")]
    InvalidObservationWindow {
        /// Display form of the observation start
        start: String,
        /// Display form of the observation end
        end: String,
    },

    /// Invalid factor correlation.
    #[error("Correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    /// Missing volatility for a delivery period.
    #[error("Volatility curve error: {0}")]
    Curve(#[from] CurveError),
}

/// One mean-reverting factor.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor<P: TimePeriod> {
    /// Mean reversion rate (non-negative)
    pub mean_reversion: f64,
    /// Volatility by delivery period
    pub vol: CurveAccessor<P>,
}

impl<P: TimePeriod> Factor<P> {
    /// Create a factor.
    pub fn new(mean_reversion: f64, vol: impl Into<CurveAccessor<P>>) -> Self {
        Self {
            mean_reversion,
            vol: vol.into(),
        }
    }

    /// Volatility for delivery `period`.
    #[inline]
    pub fn vol_at(&self, period: &P) -> Result<f64, CurveError> {
        self.vol.value(period)
    }
}

/// Correlated set of mean-reverting factors.
///
/// # Examples
///
/// ```
/// use storage_core::types::Day;
/// use storage_models::models::{Factor, MultiFactorModel};
///
/// let model = MultiFactorModel::<Day>::with_scalar_correlation(
///     Factor::new(0.0, 0.53),
///     Factor::new(2.5, 1.45),
///     0.87,
/// )
/// .unwrap();
///
/// let obs_start = Day::from_ymd(2020, 8, 5).unwrap();
/// let obs_end = Day::from_ymd(2020, 8, 30).unwrap();
/// let contract = Day::from_ymd(2020, 9, 1).unwrap();
/// assert!(model.integrated_vol(&obs_start, &obs_end, &contract).unwrap() > 0.53);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MultiFactorModel<P: TimePeriod> {
    factors: Vec<Factor<P>>,
    correlation: CorrelationMatrix,
}

impl<P: TimePeriod> MultiFactorModel<P> {
    /// Create a model from factors and their correlation matrix.
    ///
    /// # Errors
    ///
    /// - `NoFactors` if `factors` is empty
    /// - `DimensionMismatch` if the correlation dimension differs from the factor count
    /// - `InvalidMeanReversion` for a negative or non-finite mean reversion
    /// - `Correlation` if the correlation matrix is not positive semi-definite
    pub fn new(
        factors: Vec<Factor<P>>,
        correlation: CorrelationMatrix,
    ) -> Result<Self, ModelError> {
        if factors.is_empty() {
            return Err(ModelError::NoFactors);
        }
        if correlation.dim() != factors.len() {
            return Err(ModelError::DimensionMismatch {
                factors: factors.len(),
                correlation_dim: correlation.dim(),
            });
        }
        for (index, factor) in factors.iter().enumerate() {
            if !(factor.mean_reversion.is_finite() && factor.mean_reversion >= 0.0) {
                return Err(ModelError::InvalidMeanReversion {
                    index,
                    value: factor.mean_reversion,
                });
            }
        }
        correlation.cholesky()?;
        Ok(Self {
            factors,
            correlation,
        })
    }

    /// Single factor model.
    pub fn one_factor(factor: Factor<P>) -> Result<Self, ModelError> {
        Self::new(vec![factor], CorrelationMatrix::identity(1))
    }

    /// Two factor model from a scalar correlation.
    pub fn with_scalar_correlation(
        first: Factor<P>,
        second: Factor<P>,
        rho: f64,
    ) -> Result<Self, ModelError> {
        Self::new(vec![first, second], CorrelationMatrix::two_factor(rho)?)
    }

    /// Three uncorrelated factors: a mean-reverting spot factor, a
    /// non-mean-reverting long-term factor and a non-mean-reverting seasonal
    /// factor whose volatility follows a sine wave over the year, each
    /// defined for every period in `[start, end]`.
    pub fn three_factor_seasonal(
        spot_mean_reversion: f64,
        spot_vol: f64,
        long_term_vol: f64,
        seasonal_vol: f64,
        start: P,
        end: P,
    ) -> Result<Self, ModelError> {
        let seasonal = Curve::new(start.range_inclusive(&end).map(|period| {
            let day_of_year = f64::from(period.start_date().ordinal());
            let phase = 2.0 * PI * (day_of_year + 90.0) / SEASONAL_DAYS_PER_YEAR;
            (period, seasonal_vol * phase.sin())
        }))?;
        Self::new(
            vec![
                Factor::new(spot_mean_reversion, spot_vol),
                Factor::new(0.0, long_term_vol),
                Factor::new(0.0, seasonal),
            ],
            CorrelationMatrix::identity(3),
        )
    }

    /// Factors in model order.
    #[inline]
    pub fn factors(&self) -> &[Factor<P>] {
        &self.factors
    }

    /// Factor correlation matrix.
    #[inline]
    pub fn correlation(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    /// Number of factors.
    #[inline]
    pub fn num_factors(&self) -> usize {
        self.factors.len()
    }

    /// Covariance of the log returns of forwards for deliveries `c1` and
    /// `c2` over `[obs_start, obs_end]`.
    ///
    /// The window is truncated at the earlier delivery, after which one of
    /// the forwards no longer evolves.
    pub fn integrated_covar(
        &self,
        obs_start: &P,
        obs_end: &P,
        c1: &P,
        c2: &P,
    ) -> Result<f64, ModelError> {
        if obs_end < obs_start {
            return Err(ModelError::InvalidObservationWindow {
                start: obs_start.to_string(),
                end: obs_end.to_string(),
            });
        }
        let t1 = year_fraction(obs_start, c1);
        let t2 = year_fraction(obs_start, c2);
        let window = year_fraction(obs_start, obs_end).min(t1).min(t2);
        if window <= 0.0 {
            return Ok(0.0);
        }

        let mut covar = 0.0;
        for (i, fi) in self.factors.iter().enumerate() {
            let vol_i = fi.vol_at(c1)?;
            for (j, fj) in self.factors.iter().enumerate() {
                let vol_j = fj.vol_at(c2)?;
                let a = fi.mean_reversion + fj.mean_reversion;
                // Decay from the window end to each delivery; never positive
                let decay =
                    (-fi.mean_reversion * (t1 - window) - fj.mean_reversion * (t2 - window)).exp();
                let integral = if a == 0.0 {
                    window
                } else {
                    -(-a * window).exp_m1() / a
                };
                covar += vol_i * vol_j * self.correlation.get(i, j) * decay * integral;
            }
        }
        Ok(covar)
    }

    /// Variance of the log return of the forward for `contract`.
    #[inline]
    pub fn integrated_variance(
        &self,
        obs_start: &P,
        obs_end: &P,
        contract: &P,
    ) -> Result<f64, ModelError> {
        self.integrated_covar(obs_start, obs_end, contract, contract)
    }

    /// Standard deviation of the log return of the forward for `contract`.
    pub fn integrated_stdev(
        &self,
        obs_start: &P,
        obs_end: &P,
        contract: &P,
    ) -> Result<f64, ModelError> {
        Ok(self
            .integrated_variance(obs_start, obs_end, contract)?
            .max(0.0)
            .sqrt())
    }

    /// Annualised volatility over the (truncated) observation window.
    /// Zero for an empty window.
    pub fn integrated_vol(
        &self,
        obs_start: &P,
        obs_end: &P,
        contract: &P,
    ) -> Result<f64, ModelError> {
        let variance = self.integrated_variance(obs_start, obs_end, contract)?;
        let window = year_fraction(obs_start, obs_end).min(year_fraction(obs_start, contract));
        if window <= 0.0 {
            return Ok(0.0);
        }
        Ok((variance.max(0.0) / window).sqrt())
    }

    /// Correlation of the log returns of forwards for `c1` and `c2`.
    pub fn integrated_corr(
        &self,
        obs_start: &P,
        obs_end: &P,
        c1: &P,
        c2: &P,
    ) -> Result<f64, ModelError> {
        let covar = self.integrated_covar(obs_start, obs_end, c1, c2)?;
        let var1 = self.integrated_variance(obs_start, obs_end, c1)?;
        let var2 = self.integrated_variance(obs_start, obs_end, c2)?;
        Ok(covar / (var1 * var2).sqrt())
    }
}
