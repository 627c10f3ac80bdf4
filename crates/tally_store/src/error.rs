//! Error types for snapshot storage.

use std::path::PathBuf;

use tally_index::DecodeError;

/// Errors that can occur while reading or writing an index snapshot.
///
/// [`OutputsStore::load`](crate::OutputsStore::load) turns all of these into
/// an empty index; [`OutputsStore::try_load`](crate::OutputsStore::try_load)
/// exposes them to callers that need to tell the cases apart.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred while reading or writing a snapshot file.
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot header is missing, truncated or has the wrong magic bytes.
    #[error("invalid snapshot header in {path}: {reason}")]
    InvalidHeader {
        /// The snapshot file path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The payload does not match the checksum recorded in the header.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The snapshot file path.
        path: PathBuf,
        /// Checksum recorded in the header.
        expected: String,
        /// Checksum computed from the payload.
        actual: String,
    },

    /// The snapshot was written with an incompatible format version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The snapshot file path.
        path: PathBuf,
        /// The format version this build reads.
        expected: u32,
        /// The format version found in the file.
        actual: u32,
    },

    /// The payload could not be serialized or deserialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The payload deserialized but references entries that do not exist.
    #[error("corrupt index in {path}: {source}")]
    Decode {
        /// The snapshot file path.
        path: PathBuf,
        /// The structural problem found.
        source: DecodeError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = StoreError::Io {
            path: PathBuf::from("/tmp/.tally/outputs.snapshot"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("snapshot I/O error"));
        assert!(msg.contains("outputs.snapshot"));
    }

    #[test]
    fn checksum_mismatch_display() {
        let err = StoreError::ChecksumMismatch {
            path: PathBuf::from("outputs.snapshot"),
            expected: "aabb".to_string(),
            actual: "ccdd".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("aabb"));
        assert!(msg.contains("ccdd"));
    }

    #[test]
    fn version_mismatch_display() {
        let err = StoreError::VersionMismatch {
            path: PathBuf::from("outputs.snapshot"),
            expected: 1,
            actual: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 1"));
        assert!(msg.contains("got 7"));
    }

    #[test]
    fn decode_display_includes_cause() {
        let err = StoreError::Decode {
            path: PathBuf::from("outputs.snapshot"),
            source: DecodeError::TargetIndexOutOfRange {
                entry: 0,
                index: 5,
                len: 1,
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("corrupt index in outputs.snapshot"));
        assert!(msg.contains("target index 5"));
    }
}
