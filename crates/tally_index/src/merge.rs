//! Set-preserving merge and prune of target-set indexes.
//!
//! Both operations invert the index into artifact -> targets, rewrite each
//! artifact's membership, then collate back into target set -> artifacts.
//! Collating by artifact means every artifact in the result sits under exactly
//! one target set: the union of the targets that still claim it.

use std::collections::{BTreeMap, BTreeSet};

use tally_artifact::ArtifactRecord;
use tally_common::TargetSet;

use crate::index::{TargetSetIndex, TargetSetMap};

type Inverted = BTreeMap<ArtifactRecord, TargetSet>;

impl TargetSetIndex {
    /// Folds a freshly built relation into this index.
    ///
    /// See [`TargetSetIndex::append_new_outputs`].
    pub fn append_new_output_map(&self, new_outputs: TargetSetMap) -> TargetSetIndex {
        self.append_new_outputs(&TargetSetIndex::new(new_outputs))
    }

    /// Folds the outputs of a new build into this index.
    ///
    /// Every target named in `new_outputs` is refreshed: its old associations
    /// are discarded and replaced by the new ones. Targets the new build did
    /// not touch keep their associations. An existing artifact claimed only by
    /// refreshed targets is dropped unless the new build produced it again.
    /// New outputs recorded under the empty target set name no producer and
    /// are not folded in. When both sides record the same path, the new
    /// record wins.
    pub fn append_new_outputs(&self, new_outputs: &TargetSetIndex) -> TargetSetIndex {
        let new_targets: BTreeSet<String> = new_outputs
            .targets()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut inverted = Inverted::new();
        for (targets, artifact) in new_outputs.iter() {
            if targets.is_empty() {
                continue;
            }
            inverted
                .entry(artifact.clone())
                .or_default()
                .extend(targets.iter());
        }
        for (targets, artifacts) in self.as_map() {
            let remaining = targets.difference(&new_targets);
            if remaining.is_empty() {
                continue;
            }
            for artifact in artifacts {
                inverted
                    .entry(artifact.clone())
                    .or_default()
                    .extend(remaining.iter());
            }
        }

        let merged = collate(inverted);
        tracing::trace!(
            target = "tally.index",
            refreshed_targets = new_targets.len(),
            before = self.len(),
            incoming = new_outputs.len(),
            after = merged.len(),
            "merged new build outputs"
        );
        merged
    }

    /// Drops associations with targets that are no longer part of the build.
    ///
    /// Each artifact keeps only the members of its target sets that appear in
    /// `live_targets`. An artifact left with no live target is kept under the
    /// empty target set rather than removed; use
    /// [`TargetSetIndex::without_unattributed`] to drop those.
    pub fn remove_untracked_outputs<I, S>(&self, live_targets: I) -> TargetSetIndex
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let live: BTreeSet<String> = live_targets.into_iter().map(Into::into).collect();

        let mut inverted = Inverted::new();
        for (targets, artifacts) in self.as_map() {
            let kept = targets.intersection(&live);
            for artifact in artifacts {
                inverted
                    .entry(artifact.clone())
                    .or_default()
                    .extend(kept.iter());
            }
        }

        let pruned = collate(inverted);
        tracing::trace!(
            target = "tally.index",
            live_targets = live.len(),
            before = self.len(),
            after = pruned.len(),
            orphaned = pruned.unattributed().map_or(0, BTreeSet::len),
            "removed untracked outputs"
        );
        pruned
    }

    /// Returns a copy without the artifacts that have no producing target.
    pub fn without_unattributed(&self) -> TargetSetIndex {
        let mut map = self.as_map().clone();
        map.remove(&TargetSet::empty());
        TargetSetIndex::new(map)
    }
}

fn collate(inverted: Inverted) -> TargetSetIndex {
    let mut map = TargetSetMap::new();
    for (artifact, targets) in inverted {
        map.entry(targets).or_default().insert(artifact);
    }
    TargetSetIndex::new(map)
}
