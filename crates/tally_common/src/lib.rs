//! Shared foundational types used across the tally crates.
//!
//! This crate provides content hashing for persisted snapshots and the
//! [`TargetSet`] grouping key used by the output index.

#![warn(missing_docs)]

pub mod hash;
pub mod target_set;

pub use hash::ContentHash;
pub use target_set::TargetSet;
