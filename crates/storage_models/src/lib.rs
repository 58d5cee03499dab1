//! # storage_models: Storage Facility and Price Dynamics (Layer 2)
//!
//! This crate provides:
//! - The storage facility model: ratchets, constraint and cost queries,
//!   validated construction ([`storage`])
//! - Multi-factor mean-reverting price dynamics and factor correlation
//!   ([`models`])
//!
//! ## Design Principles
//!
//! - **Tagged-union constraints** fixed once at construction
//! - **Builder pattern** with one descriptively-named error per
//!   inconsistent input
//! - **Injected functions** for terminal value rather than trait objects
//!   with lifecycle
//!
//! ## Feature Flags
//!
//! - `serde` (default): Serialisation for pillars, interpolation modes and
//!   correlation matrices

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod models;
pub mod storage;
