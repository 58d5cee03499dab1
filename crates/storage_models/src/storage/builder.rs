//! Validating builder for [`StorageModel`].

use storage_core::market_data::CurveAccessor;
use storage_core::types::TimePeriod;

use super::error::StorageConfigError;
use super::model::{StorageConstraints, StorageModel};
use super::ratchet::{Ratchet, RatchetInterp, RatchetInterpolator};
use super::terminal::TerminalStorageNpv;

/// Builder for [`StorageModel`].
///
/// Inputs that are mutually exclusive (ratchets versus the four scalar/curve
/// constraint fields) are tracked as "provided or not" so that `build` can
/// name the exact inconsistent field.
///
/// # Examples
///
/// ```
/// use storage_core::types::Day;
/// use storage_models::storage::{Ratchet, RatchetInterp, StorageConfigError, StorageModel};
///
/// let start = Day::from_ymd(2019, 8, 28).unwrap();
/// let end = Day::from_ymd(2019, 9, 25).unwrap();
/// let ratchets = vec![Ratchet::new(start, vec![(0.0, -150.0, 255.2).into()])];
///
/// let result = StorageModel::builder(start, end)
///     .injection_cost(0.015)
///     .withdrawal_cost(0.02)
///     .ratchets(ratchets)
///     .ratchet_interp(RatchetInterp::Linear)
///     .min_inventory(2.54)
///     .build();
///
/// assert_eq!(
///     result.unwrap_err(),
///     StorageConfigError::UnexpectedWithRatchets { field: "min_inventory" }
/// );
/// ```
#[derive(Debug, Clone)]
pub struct StorageModelBuilder<P: TimePeriod> {
    start: P,
    end: P,
    injection_cost: Option<CurveAccessor<P>>,
    withdrawal_cost: Option<CurveAccessor<P>>,
    ratchets: Option<Vec<Ratchet<P>>>,
    ratchet_interp: Option<RatchetInterp>,
    min_inventory: Option<CurveAccessor<P>>,
    max_inventory: Option<CurveAccessor<P>>,
    max_injection_rate: Option<CurveAccessor<P>>,
    max_withdrawal_rate: Option<CurveAccessor<P>>,
    cmdty_consumed_inject: CurveAccessor<P>,
    cmdty_consumed_withdraw: CurveAccessor<P>,
    inventory_loss: CurveAccessor<P>,
    inventory_cost: CurveAccessor<P>,
    terminal_storage_npv: Option<TerminalStorageNpv>,
}

impl<P: TimePeriod> StorageModelBuilder<P> {
    /// Create a builder for a facility operable over `[start, end)`.
    pub fn new(start: P, end: P) -> Self {
        Self {
            start,
            end,
            injection_cost: None,
            withdrawal_cost: None,
            ratchets: None,
            ratchet_interp: None,
            min_inventory: None,
            max_inventory: None,
            max_injection_rate: None,
            max_withdrawal_rate: None,
            cmdty_consumed_inject: CurveAccessor::Absent,
            cmdty_consumed_withdraw: CurveAccessor::Absent,
            inventory_loss: CurveAccessor::Absent,
            inventory_cost: CurveAccessor::Absent,
            terminal_storage_npv: None,
        }
    }

    /// Cost per unit volume injected.
    pub fn injection_cost(mut self, cost: impl Into<CurveAccessor<P>>) -> Self {
        self.injection_cost = Some(cost.into());
        self
    }

    /// Cost per unit volume withdrawn.
    pub fn withdrawal_cost(mut self, cost: impl Into<CurveAccessor<P>>) -> Self {
        self.withdrawal_cost = Some(cost.into());
        self
    }

    /// Dated inventory-dependent envelopes.
    pub fn ratchets(mut self, ratchets: Vec<Ratchet<P>>) -> Self {
        self.ratchets = Some(ratchets);
        self
    }

    /// Pillar interpolation mode; required with ratchets.
    pub fn ratchet_interp(mut self, mode: RatchetInterp) -> Self {
        self.ratchet_interp = Some(mode);
        self
    }

    /// Minimum inventory; required without ratchets.
    pub fn min_inventory(mut self, value: impl Into<CurveAccessor<P>>) -> Self {
        self.min_inventory = Some(value.into());
        self
    }

    /// Maximum inventory; required without ratchets.
    pub fn max_inventory(mut self, value: impl Into<CurveAccessor<P>>) -> Self {
        self.max_inventory = Some(value.into());
        self
    }

    /// Maximum injection rate; required without ratchets.
    pub fn max_injection_rate(mut self, value: impl Into<CurveAccessor<P>>) -> Self {
        self.max_injection_rate = Some(value.into());
        self
    }

    /// Maximum withdrawal rate as a positive magnitude; required without ratchets.
    pub fn max_withdrawal_rate(mut self, value: impl Into<CurveAccessor<P>>) -> Self {
        self.max_withdrawal_rate = Some(value.into());
        self
    }

    /// Fraction of injected volume consumed.
    pub fn cmdty_consumed_inject(mut self, value: impl Into<CurveAccessor<P>>) -> Self {
        self.cmdty_consumed_inject = value.into();
        self
    }

    /// Fraction of withdrawn volume consumed.
    pub fn cmdty_consumed_withdraw(mut self, value: impl Into<CurveAccessor<P>>) -> Self {
        self.cmdty_consumed_withdraw = value.into();
        self
    }

    /// Fraction of inventory lost per period.
    pub fn inventory_loss(mut self, value: impl Into<CurveAccessor<P>>) -> Self {
        self.inventory_loss = value.into();
        self
    }

    /// Holding cost per unit inventory per period.
    pub fn inventory_cost(mut self, value: impl Into<CurveAccessor<P>>) -> Self {
        self.inventory_cost = value.into();
        self
    }

    /// Value of residual inventory at storage end.
    pub fn terminal_storage_npv<F>(mut self, f: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        self.terminal_storage_npv = Some(TerminalStorageNpv::new(f));
        self
    }

    /// Validate inputs and build the model.
    ///
    /// # Errors
    ///
    /// - `EndNotAfterStart` if `end <= start`
    /// - `MissingField` if a cost input is missing
    /// - `UnexpectedWithRatchets` / `RatchetsWithoutRatchetInterp` for
    ///   inconsistent inputs alongside ratchets
    /// - `RatchetInterpWithoutRatchets` / `MissingWithoutRatchets` for
    ///   inconsistent inputs without ratchets
    /// - Ratchet structural errors from [`RatchetInterpolator::new`]
    pub fn build(self) -> Result<StorageModel<P>, StorageConfigError> {
        if self.end <= self.start {
            return Err(StorageConfigError::EndNotAfterStart {
                start: self.start.to_string(),
                end: self.end.to_string(),
            });
        }

        let injection_cost = self
            .injection_cost
            .ok_or(StorageConfigError::MissingField {
                field: "injection_cost",
            })?;
        let withdrawal_cost = self
            .withdrawal_cost
            .ok_or(StorageConfigError::MissingField {
                field: "withdrawal_cost",
            })?;

        let constraints = match self.ratchets {
            Some(ratchets) => {
                let scalar_fields = [
                    ("min_inventory", self.min_inventory.is_some()),
                    ("max_inventory", self.max_inventory.is_some()),
                    ("max_injection_rate", self.max_injection_rate.is_some()),
                    ("max_withdrawal_rate", self.max_withdrawal_rate.is_some()),
                ];
                if let Some(&(field, _)) = scalar_fields.iter().find(|(_, provided)| *provided) {
                    return Err(StorageConfigError::UnexpectedWithRatchets { field });
                }
                let mode = self
                    .ratchet_interp
                    .ok_or(StorageConfigError::RatchetsWithoutRatchetInterp)?;
                StorageConstraints::Ratchets(RatchetInterpolator::new(ratchets, mode)?)
            }
            None => {
                if self.ratchet_interp.is_some() {
                    return Err(StorageConfigError::RatchetInterpWithoutRatchets);
                }
                StorageConstraints::Scalar {
                    min_inventory: required_without_ratchets(self.min_inventory, "min_inventory")?,
                    max_inventory: required_without_ratchets(self.max_inventory, "max_inventory")?,
                    max_injection_rate: required_without_ratchets(
                        self.max_injection_rate,
                        "max_injection_rate",
                    )?,
                    max_withdrawal_rate: required_without_ratchets(
                        self.max_withdrawal_rate,
                        "max_withdrawal_rate",
                    )?,
                }
            }
        };

        Ok(StorageModel {
            start: self.start,
            end: self.end,
            constraints,
            injection_cost,
            withdrawal_cost,
            cmdty_consumed_inject: self.cmdty_consumed_inject,
            cmdty_consumed_withdraw: self.cmdty_consumed_withdraw,
            inventory_loss: self.inventory_loss,
            inventory_cost: self.inventory_cost,
            terminal_storage_npv: self.terminal_storage_npv,
        })
    }
}

fn required_without_ratchets<P: TimePeriod>(
    value: Option<CurveAccessor<P>>,
    field: &'static str,
) -> Result<CurveAccessor<P>, StorageConfigError> {
    match value {
        Some(CurveAccessor::Absent) | None => {
            Err(StorageConfigError::MissingWithoutRatchets { field })
        }
        Some(accessor) => Ok(accessor),
    }
}
