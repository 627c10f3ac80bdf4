//! Shared ownership of the current index across readers and writers.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::index::TargetSetIndex;

/// Holds the current [`TargetSetIndex`] and serializes installation of its
/// successors.
///
/// Readers take a cheap [`Arc`] snapshot and never block on a writer that is
/// computing a merge. Writers are serialized, so two concurrent updates never
/// both derive their successor from the same predecessor and lose one
/// another's changes.
#[derive(Debug, Default)]
pub struct IndexHolder {
    current: RwLock<Arc<TargetSetIndex>>,
    writer: Mutex<()>,
}

impl IndexHolder {
    /// Creates a holder whose current index is `initial`.
    pub fn new(initial: TargetSetIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            writer: Mutex::new(()),
        }
    }

    /// Returns a snapshot of the current index.
    pub fn current(&self) -> Arc<TargetSetIndex> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Derives a successor from the current index and installs it.
    ///
    /// Concurrent calls run one after another, each seeing the index
    /// installed by the previous one.
    pub fn update<F>(&self, derive: F) -> Arc<TargetSetIndex>
    where
        F: FnOnce(&TargetSetIndex) -> TargetSetIndex,
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let successor = Arc::new(derive(&*self.current()));
        self.install(successor.clone());
        successor
    }

    /// Installs `successor` unconditionally, returning the index it replaced.
    pub fn replace(&self, successor: TargetSetIndex) -> Arc<TargetSetIndex> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.install(Arc::new(successor))
    }

    /// Installs `successor` only if the current index is still `expected`.
    ///
    /// On success returns the installed index; otherwise returns the index
    /// that is current instead, leaving it in place.
    pub fn compare_and_swap(
        &self,
        expected: &Arc<TargetSetIndex>,
        successor: TargetSetIndex,
    ) -> Result<Arc<TargetSetIndex>, Arc<TargetSetIndex>> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current();
        if !Arc::ptr_eq(&current, expected) {
            return Err(current);
        }
        let successor = Arc::new(successor);
        self.install(successor.clone());
        Ok(successor)
    }

    fn install(&self, successor: Arc<TargetSetIndex>) -> Arc<TargetSetIndex> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, successor)
    }
}
