//! `IdSet` — a dense set of 64-bit object-ids with cardinality-aware set algebra.
//!
//! Thin wrapper over `std::collections::HashSet<u64>`, in the spirit of this crate's
//! `BrandedHashSet` (a thin wrapper over a hash map for a narrow, purpose-built API) but without
//! any token-gating: an `IdSet` is always exclusively owned by whoever holds it.

use std::collections::HashSet;

/// A set of object-ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSet(HashSet<u64>);

impl IdSet {
    /// Creates an empty id-set.
    pub fn new() -> Self {
        Self(HashSet::new())
    }

    /// Creates an id-set with room for at least `capacity` ids without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(HashSet::with_capacity(capacity))
    }

    /// Builds an id-set from an iterator of ids.
    pub fn from_iter(ids: impl IntoIterator<Item = u64>) -> Self {
        Self(ids.into_iter().collect())
    }

    /// Number of ids in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if the set has no ids.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Inserts an id. Returns `true` if it was not already present.
    pub fn insert(&mut self, id: u64) -> bool {
        self.0.insert(id)
    }

    /// Removes an id. Returns `true` if it was present.
    pub fn remove(&mut self, id: u64) -> bool {
        self.0.remove(&id)
    }

    /// `true` if `id` is a member.
    pub fn contains(&self, id: u64) -> bool {
        self.0.contains(&id)
    }

    /// Iterates over the ids. Order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }

    /// Intersects `self` with `other`, iterating whichever side is smaller and probing the
    /// other -- the cardinality heuristic required by the query engine (spec §4.2).
    pub fn intersection(&self, other: &IdSet) -> IdSet {
        let (smaller, larger) = if self.len() <= other.len() {
            (&self.0, &other.0)
        } else {
            (&other.0, &self.0)
        };
        IdSet(smaller.iter().copied().filter(|id| larger.contains(id)).collect())
    }

    /// Unions `self` with `other`, cloning the larger side first and extending with the
    /// smaller -- fewer incremental inserts than extending the smaller side's clone.
    pub fn union(&self, other: &IdSet) -> IdSet {
        let (larger, smaller) = if self.len() >= other.len() {
            (&self.0, &other.0)
        } else {
            (&other.0, &self.0)
        };
        let mut out = larger.clone();
        out.extend(smaller.iter().copied());
        IdSet(out)
    }

    /// Returns the ids in `self` that are not in `other`.
    pub fn difference(&self, other: &IdSet) -> IdSet {
        IdSet(self.0.iter().copied().filter(|id| !other.0.contains(id)).collect())
    }
}

impl FromIterator<u64> for IdSet {
    fn from_iter<T: IntoIterator<Item = u64>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for IdSet {
    type Item = u64;
    type IntoIter = std::collections::hash_set::IntoIter<u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
