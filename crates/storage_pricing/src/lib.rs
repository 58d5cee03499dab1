//! # storage_pricing: Storage Valuation Engines (Layer 3)
//!
//! This crate provides:
//! - One-factor trinomial tree valuation with forward-curve deltas ([`tree`])
//! - Intrinsic valuation and the optimal operating profile ([`intrinsic`])
//! - Correlated multi-factor spot price simulation ([`simulation`])
//! - Inventory feasibility and the shared backward induction ([`valuation`])
//! - Engine settings, cancellation and progress reporting ([`config`])
//!
//! ## Usage Example
//!
//! ```rust
//! use storage_core::market_data::{Curve, CurveAccessor};
//! use storage_core::types::Day;
//! use storage_models::models::Factor;
//! use storage_models::storage::StorageModel;
//! use storage_pricing::config::TreeValuationSettings;
//! use storage_pricing::tree::TrinomialTreeEngine;
//! use storage_pricing::valuation::{SettlementRule, ValuationInputs};
//!
//! let start = Day::from_ymd(2019, 9, 1).unwrap();
//! let end = Day::from_ymd(2019, 9, 11).unwrap();
//! let storage = StorageModel::builder(start, end)
//!     .injection_cost(0.01)
//!     .withdrawal_cost(0.01)
//!     .min_inventory(0.0)
//!     .max_inventory(1000.0)
//!     .max_injection_rate(100.0)
//!     .max_withdrawal_rate(100.0)
//!     .build()
//!     .unwrap();
//!
//! let forwards = Curve::constant(start, end, 30.0).unwrap();
//! let rates = CurveAccessor::from(0.0);
//! let settlement = SettlementRule::identity();
//! let inputs = ValuationInputs::new(&storage, start, 0.0, &forwards, &rates, &settlement);
//!
//! let engine = TrinomialTreeEngine::new(TreeValuationSettings::default()).unwrap();
//! let results = engine.value(&inputs, &Factor::new(10.0, 0.5)).unwrap();
//! assert!(results.npv >= 0.0);
//! ```
//!
//! ## Parallelism
//!
//! Backward induction parallelises over lattice nodes within a time step,
//! delta bumps run concurrently, and simulation parallelises over scenarios,
//! all on the global rayon pool. Results are independent of scheduling.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod config;
pub mod error;
pub mod intrinsic;
pub mod rng;
pub mod simulation;
pub mod tree;
pub mod valuation;

pub use error::{ExportError, SimulationError, ValuationError};
