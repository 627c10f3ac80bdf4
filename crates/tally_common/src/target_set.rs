//! Groups of top-level build targets that jointly produced a set of outputs.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An unordered, duplicate-free group of target labels.
///
/// All outputs recorded under one `TargetSet` were produced by exactly that
/// group of targets during a single build invocation. The empty set is a valid
/// key and stands for "no confirmed producing target".
///
/// Backed by a [`BTreeSet`] so iteration, ordering and hashing are
/// independent of insertion order.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetSet(BTreeSet<String>);

impl TargetSet {
    /// Returns the empty target set.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns `true` if no target is a member.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of member targets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if `label` is a member.
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    /// Iterates over the member labels in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    /// Adds a label, returning `false` if it was already present.
    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        self.0.insert(label.into())
    }

    /// Returns the members not contained in `other`.
    pub fn difference(&self, other: &BTreeSet<String>) -> TargetSet {
        Self(self.0.difference(other).cloned().collect())
    }

    /// Returns the members also contained in `other`.
    pub fn intersection(&self, other: &BTreeSet<String>) -> TargetSet {
        Self(self.0.intersection(other).cloned().collect())
    }

    /// Returns the underlying ordered set.
    pub fn as_set(&self) -> &BTreeSet<String> {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for TargetSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for TargetSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for TargetSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TargetSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Debug for TargetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}
