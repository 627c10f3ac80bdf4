//! Persistent tracking of outputs across builds.
//!
//! The `OutputsTracker` ties an [`IndexHolder`] to an [`OutputsStore`]: each
//! build's results are merged into the current index, the successor is
//! installed, and the latest installed index is written to disk.

use std::sync::{Arc, Mutex, PoisonError};

use tally_index::{IndexHolder, TargetSetIndex};

use crate::error::StoreError;
use crate::store::OutputsStore;

/// The current tracked-outputs index, backed by a snapshot file.
#[derive(Debug)]
pub struct OutputsTracker {
    store: OutputsStore,
    holder: IndexHolder,
    save_lock: Mutex<()>,
}

impl OutputsTracker {
    /// Opens the tracker, loading the persisted index if there is a usable one.
    pub fn open(store: OutputsStore) -> Self {
        let index = store.load();
        Self {
            store,
            holder: IndexHolder::new(index),
            save_lock: Mutex::new(()),
        }
    }

    /// Returns a snapshot of the current index.
    pub fn current(&self) -> Arc<TargetSetIndex> {
        self.holder.current()
    }

    /// Returns the backing store.
    pub fn store(&self) -> &OutputsStore {
        &self.store
    }

    /// Merges one build's outputs into the current index and persists the result.
    pub fn record_build(
        &self,
        new_outputs: &TargetSetIndex,
    ) -> Result<Arc<TargetSetIndex>, StoreError> {
        let successor = self
            .holder
            .update(|current| current.append_new_outputs(new_outputs));
        self.save()?;
        Ok(successor)
    }

    /// Drops associations with targets not in `live_targets` and persists the result.
    pub fn retain_targets<I, S>(&self, live_targets: I) -> Result<Arc<TargetSetIndex>, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let successor = self
            .holder
            .update(|current| current.remove_untracked_outputs(live_targets));
        self.save()?;
        Ok(successor)
    }

    /// Discards all tracked outputs and deletes the snapshot.
    pub fn clear(&self) -> Result<(), StoreError> {
        let _saving = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.holder.replace(TargetSetIndex::empty());
        self.store.remove()?;
        Ok(())
    }

    /// Writes the currently installed index to the snapshot.
    ///
    /// Saves are serialized and always write the latest installed index, so a
    /// slow save can never overwrite a newer snapshot with an older index.
    pub fn save(&self) -> Result<(), StoreError> {
        let _saving = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.save(&self.holder.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_artifact::{ArtifactRecord, RemoteArtifact};
    use tally_common::TargetSet;

    fn build(label: &str, path: &str) -> TargetSetIndex {
        let targets: TargetSet = [label].into_iter().collect();
        let record: ArtifactRecord = RemoteArtifact::new(path, 1, "", "").into();
        TargetSetIndex::from_entries([(targets, record)])
    }

    #[test]
    fn record_build_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outputs.snapshot");
        {
            let tracker = OutputsTracker::open(OutputsStore::new(&path));
            tracker.record_build(&build("//a", "k8-opt/bin/a.jar")).unwrap();
            tracker.record_build(&build("//b", "k8-opt/bin/b.jar")).unwrap();
        }

        let reopened = OutputsTracker::open(OutputsStore::new(&path));
        let current = reopened.current();
        assert_eq!(current.len(), 2);
        assert!(current.get("k8-opt/bin/a.jar").is_some());
    }

    #[test]
    fn retain_targets_persists_orphans_as_unattributed() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = OutputsTracker::open(OutputsStore::new(dir.path().join("outputs.snapshot")));
        tracker.record_build(&build("//a", "k8-opt/bin/a.jar")).unwrap();
        tracker.record_build(&build("//b", "k8-opt/bin/b.jar")).unwrap();

        let pruned = tracker.retain_targets(["//a"]).unwrap();
        assert_eq!(pruned.unattributed().map(|s| s.len()), Some(1));
        assert_eq!(tracker.store().load(), *pruned);
    }

    #[test]
    fn clear_removes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = OutputsTracker::open(OutputsStore::new(dir.path().join("outputs.snapshot")));
        tracker.record_build(&build("//a", "k8-opt/bin/a.jar")).unwrap();
        tracker.clear().unwrap();
        assert!(tracker.current().is_empty());
        assert!(tracker.store().try_load().unwrap().is_none());
    }

    #[test]
    fn concurrent_builds_all_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(OutputsTracker::open(OutputsStore::new(
            dir.path().join("outputs.snapshot"),
        )));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    tracker
                        .record_build(&build(&format!("//t{i}"), &format!("k8-opt/bin/t{i}.jar")))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.store().load().len(), 4);
    }
}
