//! Durable storage for the tracked-outputs index.
//!
//! The index is persisted in its compact encoded form inside a snapshot file
//! whose header carries magic bytes, a format version and a payload checksum.
//! Loading is fail-safe: a missing, corrupt or incompatible snapshot yields
//! an empty index, so the next build simply repopulates it.

#![warn(missing_docs)]

pub mod error;
pub mod snapshot;
pub mod store;
pub mod tracker;

pub use error::StoreError;
pub use snapshot::{PayloadFormat, PersistedOutputs, SnapshotHeader};
pub use store::OutputsStore;
pub use tracker::OutputsTracker;
