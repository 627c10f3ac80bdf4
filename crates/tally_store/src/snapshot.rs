//! Snapshot file framing.
//!
//! A snapshot is laid out as a 4-byte little-endian header length, the
//! bincode-encoded [`SnapshotHeader`], then the payload. The payload is a
//! [`PersistedOutputs`] value in the format named by the header.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tally_common::ContentHash;
use tally_index::{RemoteOutputArtifacts, TrackedOutputArtifacts};

use crate::error::StoreError;

/// Magic bytes identifying a tally snapshot.
const SNAPSHOT_MAGIC: [u8; 4] = *b"TALY";

/// Current snapshot format version. Increment on breaking changes to the
/// header or payload layout.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Encoding of the snapshot payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Compact bincode encoding.
    #[default]
    Binary,
    /// Human-readable JSON.
    Json,
}

/// Header prepended to every snapshot for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Magic bytes: must be `b"TALY"`.
    pub magic: [u8; 4],

    /// Snapshot format version.
    pub format_version: u32,

    /// Version of the tool that wrote the snapshot.
    pub tally_version: String,

    /// Encoding of the payload.
    pub payload_format: PayloadFormat,

    /// Checksum of the payload bytes.
    pub checksum: ContentHash,
}

/// The persisted forms of an index this version can read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistedOutputs {
    /// Target-attributed outputs.
    Tracked(TrackedOutputArtifacts),
    /// Remote outputs recorded before target attribution existed.
    LegacyRemote(RemoteOutputArtifacts),
}

/// Serializes `outputs` into a complete snapshot file image.
pub fn encode_snapshot(
    outputs: &PersistedOutputs,
    format: PayloadFormat,
    tally_version: &str,
) -> Result<Vec<u8>, StoreError> {
    let payload = match format {
        PayloadFormat::Binary => {
            bincode::serde::encode_to_vec(outputs, bincode::config::standard()).map_err(|e| {
                StoreError::Serialization {
                    reason: e.to_string(),
                }
            })?
        }
        PayloadFormat::Json => {
            serde_json::to_vec(outputs).map_err(|e| StoreError::Serialization {
                reason: e.to_string(),
            })?
        }
    };

    let header = SnapshotHeader {
        magic: SNAPSHOT_MAGIC,
        format_version: SNAPSHOT_FORMAT_VERSION,
        tally_version: tally_version.to_string(),
        payload_format: format,
        checksum: ContentHash::of(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| StoreError::Serialization {
            reason: e.to_string(),
        })?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Validates and parses a snapshot file image read from `path`.
///
/// The header's magic, format version and checksum are all checked before
/// the payload is deserialized.
pub fn decode_snapshot(
    path: &Path,
    raw: &[u8],
) -> Result<(SnapshotHeader, PersistedOutputs), StoreError> {
    let invalid = |reason: &str| StoreError::InvalidHeader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let len_bytes: [u8; 4] = raw
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| invalid("missing header length"))?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_bytes = raw
        .get(4..4 + header_len)
        .ok_or_else(|| invalid("truncated header"))?;

    let (header, _): (SnapshotHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
            .map_err(|e| invalid(&e.to_string()))?;

    if header.magic != SNAPSHOT_MAGIC {
        return Err(invalid("bad magic bytes"));
    }
    if header.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(StoreError::VersionMismatch {
            path: path.to_path_buf(),
            expected: SNAPSHOT_FORMAT_VERSION,
            actual: header.format_version,
        });
    }

    let payload = &raw[4 + header_len..];
    header
        .checksum
        .check(payload)
        .map_err(|actual| StoreError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        })?;

    let outputs: PersistedOutputs = match header.payload_format {
        PayloadFormat::Binary => {
            bincode::serde::decode_from_slice(payload, bincode::config::standard())
                .map(|(outputs, _)| outputs)
                .map_err(|e| StoreError::Serialization {
                    reason: e.to_string(),
                })?
        }
        PayloadFormat::Json => {
            serde_json::from_slice(payload).map_err(|e| StoreError::Serialization {
                reason: e.to_string(),
            })?
        }
    };
    Ok((header, outputs))
}
