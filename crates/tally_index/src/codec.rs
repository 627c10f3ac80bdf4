//! Compact persisted form of a [`TargetSetIndex`].
//!
//! Rather than repeating full artifact records under every target set, the
//! encoded form stores each target label and each artifact once, in sorted
//! lists, and describes the relation with integer positions into those lists.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tally_artifact::{ArtifactDescriptor, ArtifactRecord, ParserRegistry, RemoteArtifactDescriptor};
use tally_common::TargetSet;

use crate::error::DecodeError;
use crate::index::{TargetSetIndex, TargetSetMap};

/// Encoded target-set index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedOutputArtifacts {
    /// Every target label appearing in any target set, sorted and deduplicated.
    pub top_level_targets: Vec<String>,

    /// Every artifact, sorted by relative path and deduplicated.
    pub output_artifacts: Vec<ArtifactDescriptor>,

    /// One entry per target set.
    pub target_sets_to_artifacts: Vec<TargetSetEntry>,
}

/// One target set and its artifacts, as positions into the encoded lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSetEntry {
    /// Positions in `top_level_targets`, ascending.
    pub target_indices: Vec<u32>,

    /// Positions in `output_artifacts`, ascending.
    pub artifact_indices: Vec<u32>,
}

/// Older encoding that recorded remote artifacts without target attribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOutputArtifacts {
    /// The recorded artifacts.
    pub artifacts: Vec<RemoteArtifactDescriptor>,
}

/// Encodes an index into its compact form.
pub fn encode(index: &TargetSetIndex) -> TrackedOutputArtifacts {
    let targets: Vec<&str> = index.targets().into_iter().collect();
    let artifacts: Vec<&ArtifactRecord> = index
        .artifacts()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let target_sets_to_artifacts = index
        .as_map()
        .iter()
        .map(|(target_set, records)| {
            let mut target_indices: Vec<u32> = target_set
                .iter()
                .filter_map(|label| targets.binary_search(&label).ok())
                .map(wire_position)
                .collect();
            target_indices.sort_unstable();

            let mut artifact_indices: Vec<u32> = records
                .iter()
                .filter_map(|record| artifacts.binary_search(&record).ok())
                .map(wire_position)
                .collect();
            artifact_indices.sort_unstable();

            TargetSetEntry {
                target_indices,
                artifact_indices,
            }
        })
        .collect();

    TrackedOutputArtifacts {
        top_level_targets: targets.into_iter().map(str::to_string).collect(),
        output_artifacts: artifacts.iter().map(|a| a.to_descriptor()).collect(),
        target_sets_to_artifacts,
    }
}

/// Converts a list position to its `u32` wire form. Positions past
/// `u32::MAX` saturate, so decode reports them as out of range instead of
/// resolving them to a wrong entry.
fn wire_position(position: usize) -> u32 {
    u32::try_from(position).unwrap_or(u32::MAX)
}

/// Decodes the compact form back into an index.
///
/// Artifact descriptors that no registered parser recognizes are skipped
/// wherever they are referenced. An index outside either list is structural
/// corruption and fails the whole decode.
pub fn decode(
    encoded: &TrackedOutputArtifacts,
    registry: &ParserRegistry,
    output_base: Option<&Path>,
) -> Result<TargetSetIndex, DecodeError> {
    let targets = &encoded.top_level_targets;
    let artifacts: Vec<Option<ArtifactRecord>> = encoded
        .output_artifacts
        .iter()
        .map(|descriptor| registry.parse(descriptor, output_base))
        .collect();

    let skipped = artifacts.iter().filter(|a| a.is_none()).count();
    if skipped > 0 {
        tracing::debug!(
            target = "tally.index",
            skipped,
            total = artifacts.len(),
            "skipping unparseable output artifacts"
        );
    }

    let mut map = TargetSetMap::new();
    for (entry_pos, entry) in encoded.target_sets_to_artifacts.iter().enumerate() {
        let target_set = entry
            .target_indices
            .iter()
            .map(|&index| {
                targets
                    .get(index as usize)
                    .cloned()
                    .ok_or(DecodeError::TargetIndexOutOfRange {
                        entry: entry_pos,
                        index,
                        len: targets.len(),
                    })
            })
            .collect::<Result<TargetSet, _>>()?;

        let mut records = BTreeSet::new();
        for &index in &entry.artifact_indices {
            match artifacts.get(index as usize) {
                Some(Some(record)) => {
                    records.insert(record.clone());
                }
                Some(None) => {}
                None => {
                    return Err(DecodeError::ArtifactIndexOutOfRange {
                        entry: entry_pos,
                        index,
                        len: artifacts.len(),
                    })
                }
            }
        }
        map.entry(target_set).or_default().extend(records);
    }

    Ok(TargetSetIndex::new(map))
}

/// Decodes the older remote-only encoding.
///
/// The artifacts carry no target attribution, so all of them land under the
/// empty target set. The next merge with real build results drops them.
pub fn decode_legacy_remote(
    encoded: &RemoteOutputArtifacts,
    registry: &ParserRegistry,
) -> TargetSetIndex {
    let artifacts: BTreeSet<ArtifactRecord> = encoded
        .artifacts
        .iter()
        .filter_map(|remote| registry.parse(&ArtifactDescriptor::remote(remote.clone()), None))
        .collect();

    let mut map = TargetSetMap::new();
    map.insert(TargetSet::empty(), artifacts);
    TargetSetIndex::new(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_artifact::{LocalArtifact, RemoteArtifact, StorageKind};

    fn set(labels: &[&str]) -> TargetSet {
        labels.iter().copied().collect()
    }

    fn remote(path: &str) -> ArtifactRecord {
        RemoteArtifact::new(path, 4, format!("bytestream://cas/{path}"), "digest").into()
    }

    fn remote_descriptor(path: &str) -> RemoteArtifactDescriptor {
        RemoteArtifactDescriptor {
            relative_path: path.to_string(),
            length: 1,
            ..RemoteArtifactDescriptor::default()
        }
    }

    fn sample() -> TargetSetIndex {
        TargetSetIndex::from_entries([
            (set(&["//b", "//a"]), remote("k8-opt/bin/z.jar")),
            (set(&["//b", "//a"]), remote("k8-opt/bin/a.jar")),
            (set(&["//c"]), remote("k8-opt/bin/a.jar")),
            (TargetSet::empty(), remote("k8-opt/genfiles/m.h")),
        ])
    }

    #[test]
    fn lists_are_sorted_and_deduplicated() {
        let encoded = encode(&sample());
        assert_eq!(encoded.top_level_targets, vec!["//a", "//b", "//c"]);
        let paths: Vec<&str> = encoded
            .output_artifacts
            .iter()
            .map(|d| d.artifact.as_ref().unwrap().relative_path.as_str())
            .collect();
        assert_eq!(
            paths,
            vec!["k8-opt/bin/a.jar", "k8-opt/bin/z.jar", "k8-opt/genfiles/m.h"]
        );
    }

    #[test]
    fn entries_reference_positions() {
        let encoded = encode(&sample());
        assert!(encoded.target_sets_to_artifacts.contains(&TargetSetEntry {
            target_indices: vec![0, 1],
            artifact_indices: vec![0, 1],
        }));
        assert!(encoded.target_sets_to_artifacts.contains(&TargetSetEntry {
            target_indices: vec![2],
            artifact_indices: vec![0],
        }));
        assert!(encoded.target_sets_to_artifacts.contains(&TargetSetEntry {
            target_indices: vec![],
            artifact_indices: vec![2],
        }));
    }

    #[test]
    fn roundtrip_preserves_associations() {
        let index = sample();
        let decoded = decode(&encode(&index), &ParserRegistry::standard(), None).unwrap();
        assert_eq!(decoded, index);
        assert!(decoded.unattributed().is_some());
    }

    #[test]
    fn roundtrip_through_json() {
        let encoded = encode(&sample());
        let json = serde_json::to_string(&encoded).unwrap();
        let back: TrackedOutputArtifacts = serde_json::from_str(&json).unwrap();
        assert_eq!(back, encoded);
    }

    #[test]
    fn local_records_resolve_against_output_base() {
        let record: ArtifactRecord =
            LocalArtifact::new("execroot/k8-opt/bin/a.jar", "k8-opt/bin/a.jar").into();
        let index = TargetSetIndex::from_entries([(set(&["//a"]), record)]);
        let decoded = decode(
            &encode(&index),
            &ParserRegistry::standard(),
            Some(Path::new("/base")),
        )
        .unwrap();
        match decoded.get("k8-opt/bin/a.jar").unwrap() {
            ArtifactRecord::Local(local) => {
                assert_eq!(local.file(), Path::new("/base/execroot/k8-opt/bin/a.jar"))
            }
            other => panic!("expected local record, got {other:?}"),
        }
    }

    #[test]
    fn target_index_out_of_range_fails() {
        let mut encoded = encode(&sample());
        encoded.target_sets_to_artifacts.push(TargetSetEntry {
            target_indices: vec![3],
            artifact_indices: vec![0],
        });
        let err = decode(&encoded, &ParserRegistry::standard(), None).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TargetIndexOutOfRange {
                entry: 3,
                index: 3,
                len: 3,
            }
        );
    }

    #[test]
    fn artifact_index_out_of_range_fails() {
        let mut encoded = encode(&sample());
        encoded.target_sets_to_artifacts[0].artifact_indices.push(99);
        let err = decode(&encoded, &ParserRegistry::standard(), None).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::ArtifactIndexOutOfRange {
                entry: 0,
                index: 99,
                len: 3,
            }
        ));
    }

    #[test]
    fn unparseable_artifacts_are_skipped() {
        let mut encoded = encode(&sample());
        encoded.output_artifacts[0] = ArtifactDescriptor::default();
        let decoded = decode(&encoded, &ParserRegistry::standard(), None).unwrap();
        assert!(decoded.get("k8-opt/bin/a.jar").is_none());
        assert!(decoded.get("k8-opt/bin/z.jar").is_some());
        assert!(decoded.artifacts_for(&set(&["//c"])).is_none());
    }

    #[test]
    fn duplicate_entries_are_merged() {
        let encoded = TrackedOutputArtifacts {
            top_level_targets: vec!["//a".to_string()],
            output_artifacts: vec![
                ArtifactDescriptor::remote(remote_descriptor("k8-opt/bin/x")),
                ArtifactDescriptor::remote(remote_descriptor("k8-opt/bin/y")),
            ],
            target_sets_to_artifacts: vec![
                TargetSetEntry {
                    target_indices: vec![0],
                    artifact_indices: vec![0],
                },
                TargetSetEntry {
                    target_indices: vec![0],
                    artifact_indices: vec![1],
                },
            ],
        };
        let decoded = decode(&encoded, &ParserRegistry::standard(), None).unwrap();
        assert_eq!(decoded.artifacts_for(&set(&["//a"])).map(BTreeSet::len), Some(2));
    }

    #[test]
    fn legacy_remote_outputs_are_unattributed() {
        let legacy = RemoteOutputArtifacts {
            artifacts: vec![
                remote_descriptor("k8-opt/bin/a.jar"),
                remote_descriptor("k8-opt/bin/b.jar"),
                RemoteArtifactDescriptor::default(),
            ],
        };
        let index = decode_legacy_remote(&legacy, &ParserRegistry::standard());
        assert_eq!(index.target_sets().collect::<Vec<_>>(), vec![&TargetSet::empty()]);
        assert_eq!(index.len(), 2);
        assert!(index.has_remote_outputs());
        assert_eq!(
            index.get("k8-opt/bin/a.jar").map(ArtifactRecord::storage_kind),
            Some(StorageKind::Remote)
        );
    }

    #[test]
    fn empty_legacy_list_is_empty_index() {
        let index =
            decode_legacy_remote(&RemoteOutputArtifacts::default(), &ParserRegistry::standard());
        assert!(index.is_empty());
    }

    #[test]
    fn oversized_positions_saturate() {
        assert_eq!(wire_position(7), 7);
        assert_eq!(wire_position(u32::MAX as usize), u32::MAX);
        assert_eq!(wire_position(usize::MAX), u32::MAX);
    }

    #[test]
    fn saturated_position_fails_decode() {
        let mut encoded = encode(&sample());
        encoded.target_sets_to_artifacts[0]
            .artifact_indices
            .push(wire_position(usize::MAX));
        let err = decode(&encoded, &ParserRegistry::standard(), None).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::ArtifactIndexOutOfRange {
                index: u32::MAX,
                ..
            }
        ));
    }

    #[test]
    fn empty_index_encodes_to_empty_lists() {
        let encoded = encode(&TargetSetIndex::empty());
        assert_eq!(encoded, TrackedOutputArtifacts::default());
        assert!(decode(&encoded, &ParserRegistry::standard(), None)
            .unwrap()
            .is_empty());
    }
}
