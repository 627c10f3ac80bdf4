//! Output artifact records.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::descriptor::{ArtifactDescriptor, LocalFileDescriptor, RemoteArtifactDescriptor};
use crate::mnemonic::configuration_mnemonic;
use crate::state::ArtifactState;

/// Where the bytes of an artifact live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// On the local filesystem.
    Local,
    /// In remote storage.
    Remote,
}

/// A single build output.
///
/// Equality, ordering and hashing use only the blaze-out-relative path: a
/// local and a remote record for the same path are the same artifact.
#[derive(Clone)]
pub enum ArtifactRecord {
    /// An output available as a file on local disk.
    Local(LocalArtifact),
    /// An output stored remotely.
    Remote(RemoteArtifact),
}

/// An output available as a file on local disk.
#[derive(Debug, Clone)]
pub struct LocalArtifact {
    file: PathBuf,
    relative_path: String,
    configuration_mnemonic: String,
}

/// An output stored remotely, addressed by a bytestream URI.
#[derive(Debug, Clone)]
pub struct RemoteArtifact {
    relative_path: String,
    configuration_mnemonic: String,
    length: u64,
    bytestream_uri: String,
    digest: String,
    sync_start_time_millis: u64,
}

impl LocalArtifact {
    /// Creates a record for `file`, an output with the given blaze-out-relative path.
    pub fn new(file: impl Into<PathBuf>, relative_path: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        Self {
            file: file.into(),
            configuration_mnemonic: configuration_mnemonic(&relative_path).to_string(),
            relative_path,
        }
    }

    /// Location of the file on disk.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Size of the file, or 0 if it cannot be read.
    pub fn length(&self) -> u64 {
        std::fs::metadata(&self.file).map(|m| m.len()).unwrap_or(0)
    }

    fn modified_millis(&self) -> Option<u64> {
        let modified = std::fs::metadata(&self.file).ok()?.modified().ok()?;
        let millis = modified.duration_since(UNIX_EPOCH).ok()?.as_millis();
        u64::try_from(millis).ok()
    }
}

impl RemoteArtifact {
    /// Creates a remote record for the given blaze-out-relative path.
    pub fn new(
        relative_path: impl Into<String>,
        length: u64,
        bytestream_uri: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        let relative_path = relative_path.into();
        Self {
            configuration_mnemonic: configuration_mnemonic(&relative_path).to_string(),
            relative_path,
            length,
            bytestream_uri: bytestream_uri.into(),
            digest: digest.into(),
            sync_start_time_millis: 0,
        }
    }

    /// Records the start time of the sync that observed this blob.
    pub fn with_sync_start_time(mut self, millis: u64) -> Self {
        self.sync_start_time_millis = millis;
        self
    }

    /// URI the blob can be fetched from.
    pub fn bytestream_uri(&self) -> &str {
        &self.bytestream_uri
    }

    /// Content digest reported by the build.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Start time of the sync that observed this blob, in milliseconds.
    pub fn sync_start_time_millis(&self) -> u64 {
        self.sync_start_time_millis
    }
}

impl ArtifactRecord {
    /// Blaze-out-relative path, the identity of the artifact.
    pub fn relative_path(&self) -> &str {
        match self {
            ArtifactRecord::Local(local) => &local.relative_path,
            ArtifactRecord::Remote(remote) => &remote.relative_path,
        }
    }

    /// Key identifying the artifact across builds.
    pub fn key(&self) -> &str {
        self.relative_path()
    }

    /// Size in bytes, or 0 if unknown.
    ///
    /// For local records this reads file metadata.
    pub fn length(&self) -> u64 {
        match self {
            ArtifactRecord::Local(local) => local.length(),
            ArtifactRecord::Remote(remote) => remote.length,
        }
    }

    /// Configuration segment of the output path.
    pub fn configuration_mnemonic(&self) -> &str {
        match self {
            ArtifactRecord::Local(local) => &local.configuration_mnemonic,
            ArtifactRecord::Remote(remote) => &remote.configuration_mnemonic,
        }
    }

    /// Where the artifact's bytes live.
    pub fn storage_kind(&self) -> StorageKind {
        match self {
            ArtifactRecord::Local(_) => StorageKind::Local,
            ArtifactRecord::Remote(_) => StorageKind::Remote,
        }
    }

    /// Returns `true` for remotely stored artifacts.
    pub fn is_remote(&self) -> bool {
        self.storage_kind() == StorageKind::Remote
    }

    /// Computes the change-detection state of the artifact.
    ///
    /// Local records stat the file and return `None` if that fails.
    pub fn artifact_state(&self) -> Option<ArtifactState> {
        match self {
            ArtifactRecord::Local(local) => Some(ArtifactState::LocalFile {
                key: local.relative_path.clone(),
                timestamp_millis: local.modified_millis()?,
            }),
            ArtifactRecord::Remote(remote) => Some(ArtifactState::Remote {
                key: remote.relative_path.clone(),
                digest: remote.digest.clone(),
            }),
        }
    }

    /// Converts the record to its persisted descriptor.
    ///
    /// Local descriptors capture the current modification time (0 if the
    /// file cannot be stat'ed).
    pub fn to_descriptor(&self) -> ArtifactDescriptor {
        match self {
            ArtifactRecord::Local(local) => ArtifactDescriptor::local(LocalFileDescriptor {
                path: local.file.to_string_lossy().into_owned(),
                relative_path: local.relative_path.clone(),
                timestamp_millis: local.modified_millis().unwrap_or(0),
            }),
            ArtifactRecord::Remote(remote) => {
                ArtifactDescriptor::remote(RemoteArtifactDescriptor {
                    relative_path: remote.relative_path.clone(),
                    length: remote.length,
                    bytestream_uri: remote.bytestream_uri.clone(),
                    digest: remote.digest.clone(),
                    sync_start_time_millis: remote.sync_start_time_millis,
                })
            }
        }
    }
}

impl From<LocalArtifact> for ArtifactRecord {
    fn from(local: LocalArtifact) -> Self {
        ArtifactRecord::Local(local)
    }
}

impl From<RemoteArtifact> for ArtifactRecord {
    fn from(remote: RemoteArtifact) -> Self {
        ArtifactRecord::Remote(remote)
    }
}

impl PartialEq for ArtifactRecord {
    fn eq(&self, other: &Self) -> bool {
        self.relative_path() == other.relative_path()
    }
}

impl Eq for ArtifactRecord {}

impl Hash for ArtifactRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relative_path().hash(state);
    }
}

impl PartialOrd for ArtifactRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArtifactRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.relative_path().cmp(other.relative_path())
    }
}

impl fmt::Display for ArtifactRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.relative_path())
    }
}

impl fmt::Debug for ArtifactRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactRecord::Local(_) => write!(f, "Local({})", self.relative_path()),
            ArtifactRecord::Remote(_) => write!(f, "Remote({})", self.relative_path()),
        }
    }
}
