//! Change-detection state of an artifact between builds.

use serde::{Deserialize, Serialize};

/// A snapshot of the properties used to decide whether an artifact changed
/// between two builds.
///
/// The key is stable across builds for the same output, while the timestamp
/// or digest changes whenever the output content does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactState {
    /// A local file, compared by modification time.
    LocalFile {
        /// Stable artifact key (the blaze-out-relative path).
        key: String,
        /// Last modification time in milliseconds since the Unix epoch.
        timestamp_millis: u64,
    },
    /// A remote blob, compared by content digest.
    Remote {
        /// Stable artifact key (the blaze-out-relative path).
        key: String,
        /// Content digest reported by the build.
        digest: String,
    },
}

impl ArtifactState {
    /// Returns the stable key of the artifact this state describes.
    pub fn key(&self) -> &str {
        match self {
            ArtifactState::LocalFile { key, .. } | ArtifactState::Remote { key, .. } => key,
        }
    }

    /// Returns `true` if `other` describes a different version of the same artifact.
    pub fn is_outdated_by(&self, other: &ArtifactState) -> bool {
        self.key() == other.key() && self != other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_shared_across_variants() {
        let local = ArtifactState::LocalFile {
            key: "k8-opt/bin/a.jar".to_string(),
            timestamp_millis: 10,
        };
        let remote = ArtifactState::Remote {
            key: "k8-opt/bin/a.jar".to_string(),
            digest: "abc".to_string(),
        };
        assert_eq!(local.key(), remote.key());
    }

    #[test]
    fn newer_timestamp_outdates() {
        let old = ArtifactState::LocalFile {
            key: "k8-opt/bin/a.jar".to_string(),
            timestamp_millis: 10,
        };
        let new = ArtifactState::LocalFile {
            key: "k8-opt/bin/a.jar".to_string(),
            timestamp_millis: 20,
        };
        assert!(old.is_outdated_by(&new));
        assert!(!old.is_outdated_by(&old.clone()));
    }

    #[test]
    fn different_keys_never_outdate() {
        let a = ArtifactState::Remote {
            key: "a".to_string(),
            digest: "1".to_string(),
        };
        let b = ArtifactState::Remote {
            key: "b".to_string(),
            digest: "2".to_string(),
        };
        assert!(!a.is_outdated_by(&b));
    }
}
