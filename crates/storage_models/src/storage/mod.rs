//! Commodity storage facility model.
//!
//! This module provides:
//! - [`RatchetInterpolator`]: Dated, inventory-dependent rate envelopes
//! - [`StorageModel`]: Immutable facility with constraint and cost queries
//! - [`StorageModelBuilder`]: Validating construction
//! - [`TerminalStorageNpv`]: Injected terminal value function
//!
//! Constraints are held as a tagged union ([`StorageConstraints`]) fixed at
//! construction, so queries never inspect which optional inputs were given.

mod builder;
mod error;
mod model;
mod ratchet;
mod terminal;

pub use builder::StorageModelBuilder;
pub use error::{StorageConfigError, StorageQueryError};
pub use model::{StorageConstraints, StorageModel};
pub use ratchet::{Ratchet, RatchetInterp, RatchetInterpolator, RatchetPillar};
pub use terminal::TerminalStorageNpv;
