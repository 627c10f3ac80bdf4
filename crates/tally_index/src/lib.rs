//! Index of build outputs grouped by the set of top-level targets that
//! produced them.
//!
//! A [`TargetSetIndex`] is immutable. Incremental builds fold their outputs in
//! with [`TargetSetIndex::append_new_outputs`], targets that left the build
//! graph are dropped with [`TargetSetIndex::remove_untracked_outputs`], and
//! both return a new index. The [`codec`] module converts an index to and from
//! its compact persisted form, and [`IndexHolder`] serializes installation of
//! successors when several writers share one current index.

#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod holder;
pub mod index;
mod merge;
mod resolve;

pub use codec::{
    decode, decode_legacy_remote, encode, RemoteOutputArtifacts, TargetSetEntry,
    TrackedOutputArtifacts,
};
pub use error::DecodeError;
pub use holder::IndexHolder;
pub use index::{TargetSetIndex, TargetSetMap};
pub use resolve::POSSIBLY_MISSING_PATH_COMPONENTS;
