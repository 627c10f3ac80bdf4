//! Persisted descriptors for local and remote output artifacts.
//!
//! A descriptor carries at most one of a local-file or remote-artifact
//! payload. Descriptors written by a newer tool version may carry a payload
//! kind this version does not know about; such descriptors deserialize with
//! neither payload set and are reported as [`DescriptorKind::Unrecognized`].

use serde::{Deserialize, Serialize};

/// Which payload a descriptor carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DescriptorKind {
    /// A file on local disk.
    LocalFile,
    /// A blob in remote storage.
    RemoteArtifact,
    /// No payload this version understands.
    Unrecognized,
}

/// Serialized form of a single output artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    /// Local-file payload.
    #[serde(default)]
    pub local_file: Option<LocalFileDescriptor>,

    /// Remote-artifact payload.
    #[serde(default)]
    pub artifact: Option<RemoteArtifactDescriptor>,
}

/// A file on local disk produced by a build action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFileDescriptor {
    /// Location of the file, absolute or relative to the output base.
    pub path: String,

    /// Blaze-out-relative path of the output.
    #[serde(default)]
    pub relative_path: String,

    /// Modification time when the descriptor was written, in milliseconds.
    #[serde(default)]
    pub timestamp_millis: u64,
}

/// A blob in remote storage produced by a build action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteArtifactDescriptor {
    /// Blaze-out-relative path of the output.
    pub relative_path: String,

    /// Size in bytes, 0 if unknown.
    #[serde(default)]
    pub length: u64,

    /// URI the blob can be fetched from.
    #[serde(default)]
    pub bytestream_uri: String,

    /// Content digest reported by the build.
    #[serde(default)]
    pub digest: String,

    /// Start time of the sync that first observed this blob, in milliseconds.
    #[serde(default)]
    pub sync_start_time_millis: u64,
}

impl ArtifactDescriptor {
    /// Wraps a local-file payload.
    pub fn local(local: LocalFileDescriptor) -> Self {
        Self {
            local_file: Some(local),
            artifact: None,
        }
    }

    /// Wraps a remote-artifact payload.
    pub fn remote(remote: RemoteArtifactDescriptor) -> Self {
        Self {
            local_file: None,
            artifact: Some(remote),
        }
    }

    /// Returns the kind of payload carried. A local payload takes precedence.
    pub fn kind(&self) -> DescriptorKind {
        if self.local_file.is_some() {
            DescriptorKind::LocalFile
        } else if self.artifact.is_some() {
            DescriptorKind::RemoteArtifact
        } else {
            DescriptorKind::Unrecognized
        }
    }
}
