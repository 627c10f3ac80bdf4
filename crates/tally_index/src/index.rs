//! The target-set index and its lazily computed views.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::OnceLock;

use tally_artifact::{configuration_mnemonic, ArtifactRecord};
use tally_common::TargetSet;

/// Raw relation from target sets to the artifacts they produced.
pub type TargetSetMap = BTreeMap<TargetSet, BTreeSet<ArtifactRecord>>;

/// Immutable relation between groups of top-level targets and the output
/// artifacts they produced.
///
/// An artifact may appear under any number of target sets. Artifacts with no
/// confirmed producer live under the empty set. Target sets that differ in
/// membership are always separate keys, even if they map to the same
/// artifacts.
///
/// Derived views (the path map, configuration mnemonics and the remote flag)
/// are computed on first use and cached for the lifetime of the instance.
/// Every update returns a new index with its own, uncomputed views.
#[derive(Clone, Default)]
pub struct TargetSetIndex {
    target_sets_to_artifacts: TargetSetMap,
    path_to_artifact: OnceLock<HashMap<String, ArtifactRecord>>,
    configuration_mnemonics: OnceLock<BTreeSet<String>>,
    has_remote_outputs: OnceLock<bool>,
}

impl TargetSetIndex {
    /// Returns an index with no associations.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates an index from a raw target-set relation.
    ///
    /// Target sets with no artifacts are not recorded.
    pub fn new(mut target_sets_to_artifacts: TargetSetMap) -> Self {
        target_sets_to_artifacts.retain(|_, artifacts| !artifacts.is_empty());
        Self {
            target_sets_to_artifacts,
            ..Self::default()
        }
    }

    /// Creates an index from individual (target set, artifact) associations.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (TargetSet, ArtifactRecord)>,
    {
        let mut map = TargetSetMap::new();
        for (targets, artifact) in entries {
            map.entry(targets).or_default().insert(artifact);
        }
        Self::new(map)
    }

    /// Number of (target set, artifact) associations.
    pub fn len(&self) -> usize {
        self.target_sets_to_artifacts.values().map(BTreeSet::len).sum()
    }

    /// Returns `true` if the index holds no associations.
    pub fn is_empty(&self) -> bool {
        self.target_sets_to_artifacts.is_empty()
    }

    /// Returns the underlying relation.
    pub fn as_map(&self) -> &TargetSetMap {
        &self.target_sets_to_artifacts
    }

    /// Iterates over all (target set, artifact) associations.
    pub fn iter(&self) -> impl Iterator<Item = (&TargetSet, &ArtifactRecord)> + '_ {
        self.target_sets_to_artifacts
            .iter()
            .flat_map(|(targets, artifacts)| artifacts.iter().map(move |a| (targets, a)))
    }

    /// Iterates over the distinct target sets used as keys.
    pub fn target_sets(&self) -> impl Iterator<Item = &TargetSet> + '_ {
        self.target_sets_to_artifacts.keys()
    }

    /// Returns every target label appearing in any key.
    pub fn targets(&self) -> BTreeSet<&str> {
        self.target_sets().flat_map(|targets| targets.iter()).collect()
    }

    /// Iterates over all artifact values. An artifact recorded under several
    /// target sets is yielded once per set.
    pub fn artifacts(&self) -> impl Iterator<Item = &ArtifactRecord> + '_ {
        self.target_sets_to_artifacts.values().flatten()
    }

    /// Returns the artifacts recorded under exactly `targets`.
    pub fn artifacts_for(&self, targets: &TargetSet) -> Option<&BTreeSet<ArtifactRecord>> {
        self.target_sets_to_artifacts.get(targets)
    }

    /// Returns every artifact associated with a target set containing `label`.
    pub fn artifacts_for_target(&self, label: &str) -> BTreeSet<&ArtifactRecord> {
        self.target_sets_to_artifacts
            .iter()
            .filter(|(targets, _)| targets.contains(label))
            .flat_map(|(_, artifacts)| artifacts)
            .collect()
    }

    /// Returns the artifacts with no confirmed producing target.
    pub fn unattributed(&self) -> Option<&BTreeSet<ArtifactRecord>> {
        self.artifacts_for(&TargetSet::empty())
    }

    /// Looks up an artifact by its exact blaze-out-relative path.
    pub fn get(&self, relative_path: &str) -> Option<&ArtifactRecord> {
        self.path_to_artifact().get(relative_path)
    }

    /// Returns `true` if any recorded artifact lives in remote storage.
    pub fn has_remote_outputs(&self) -> bool {
        *self
            .has_remote_outputs
            .get_or_init(|| self.artifacts().any(ArtifactRecord::is_remote))
    }

    /// Returns the configuration mnemonics of all recorded output paths.
    pub fn configuration_mnemonics(&self) -> &BTreeSet<String> {
        self.configuration_mnemonics.get_or_init(|| {
            self.artifacts()
                .map(|a| configuration_mnemonic(a.relative_path()).to_string())
                .collect()
        })
    }

    fn path_to_artifact(&self) -> &HashMap<String, ArtifactRecord> {
        self.path_to_artifact.get_or_init(|| {
            let mut paths = HashMap::new();
            for artifact in self.artifacts() {
                paths
                    .entry(artifact.relative_path().to_string())
                    .or_insert_with(|| artifact.clone());
            }
            paths
        })
    }
}

impl From<TargetSetMap> for TargetSetIndex {
    fn from(map: TargetSetMap) -> Self {
        Self::new(map)
    }
}

impl FromIterator<(TargetSet, ArtifactRecord)> for TargetSetIndex {
    fn from_iter<I: IntoIterator<Item = (TargetSet, ArtifactRecord)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl PartialEq for TargetSetIndex {
    fn eq(&self, other: &Self) -> bool {
        self.target_sets_to_artifacts == other.target_sets_to_artifacts
    }
}

impl Eq for TargetSetIndex {}

impl fmt::Debug for TargetSetIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.target_sets_to_artifacts.iter()).finish()
    }
}
