//! Core models shipped with the harness.
//!
//! Real cores are generated hardware models bound through their own adapter crates; the
//! harness itself only ships a scripted bus-functional model for driving the bus directly.

/// Scripted bus-functional model.
pub mod bfm;

pub use bfm::{BfmOp, BfmScript, BusFunctionalModel, IssuedRequest, ObservedResponse};
