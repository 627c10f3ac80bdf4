//! Build output artifact records and their serialized descriptors.
//!
//! An [`ArtifactRecord`] describes one output produced by a build action,
//! either a file on local disk or a blob in remote storage. Records are
//! identified solely by their blaze-out-relative path. Descriptors are the
//! persisted form; a [`ParserRegistry`] turns them back into records.

#![warn(missing_docs)]

pub mod descriptor;
pub mod location;
pub mod mnemonic;
pub mod parser;
pub mod record;
pub mod state;

pub use descriptor::{
    ArtifactDescriptor, DescriptorKind, LocalFileDescriptor, RemoteArtifactDescriptor,
};
pub use location::{ArtifactLocation, OUTPUT_ROOT_PREFIX};
pub use mnemonic::configuration_mnemonic;
pub use parser::{ParseFn, ParserRegistry};
pub use record::{ArtifactRecord, LocalArtifact, RemoteArtifact, StorageKind};
pub use state::ArtifactState;
