//! Buckets — the leaf storage of an `AttributeIndex` (spec §4.1).
//!
//! A `HashBucket` holds many distinct value-hashes; a `DictBucket` holds exactly one value-hash,
//! partitioned internally by equality of the original attribute value. `Bucket` is the tagged
//! union `AttributeIndex` actually stores, matching this crate's existing pattern of a thin
//! dispatching enum over a couple of concrete representations (see e.g.
//! `collections/other/cow.rs` in the teacher lineage).

use std::collections::HashMap;

use super::error::{IndexError, Result};
use super::id_set::IdSet;
use super::value::{value_hash, Value};

/// A bucket holding many distinct value-hashes.
///
/// Invariant: `hash_counts.values().sum() == ids.len()`.
#[derive(Debug, Default, Clone)]
pub struct HashBucket {
    hash_counts: HashMap<i64, usize>,
    ids: IdSet,
}

impl HashBucket {
    /// Creates an empty `HashBucket`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `object_id`, known to have attribute hash `value_hash`.
    pub fn add(&mut self, value_hash: i64, object_id: u64) {
        *self.hash_counts.entry(value_hash).or_insert(0) += 1;
        self.ids.insert(object_id);
    }

    /// Removes `object_id`, known to have attribute hash `value_hash`.
    ///
    /// # Errors
    /// Returns [`IndexError::NotPresent`] if `object_id` was not a member.
    pub fn remove(&mut self, value_hash: i64, object_id: u64) -> Result<()> {
        if !self.ids.remove(object_id) {
            return Err(IndexError::NotPresent);
        }
        match self.hash_counts.get_mut(&value_hash) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.hash_counts.remove(&value_hash);
            }
            None => {
                debug_assert!(false, "hash_counts missing an entry implied by ids");
            }
        }
        Ok(())
    }

    /// Number of object-ids held.
    pub fn size(&self) -> usize {
        self.ids.len()
    }

    /// Enumerates the held object-ids. Order is unspecified.
    pub fn all_ids(&self) -> Vec<u64> {
        self.ids.iter().collect()
    }

    /// Number of distinct value-hashes currently held.
    pub fn distinct_hash_count(&self) -> usize {
        self.hash_counts.len()
    }

    /// If every member shares one value-hash, returns it.
    pub fn single_hash(&self) -> Option<i64> {
        let mut keys = self.hash_counts.keys();
        let first = *keys.next()?;
        if keys.next().is_none() {
            Some(first)
        } else {
            None
        }
    }

    /// Repartitions the bucket: the lower-hash half stays in `self`, the upper-hash half
    /// (value-hash counts and ids) is returned. Only valid to call when
    /// `distinct_hash_count() >= 2` -- the caller (`AttributeIndex`) must convert to a
    /// `DictBucket` instead when there is only one distinct hash.
    ///
    /// `extract` recomputes the attribute's value-hash for a given object-id by reading the
    /// live object out of `lookup`, since a `HashBucket` does not itself remember which id
    /// produced which hash.
    pub fn split(
        &mut self,
        mut extract_hash: impl FnMut(u64) -> i64,
    ) -> (HashMap<i64, usize>, IdSet) {
        debug_assert!(self.hash_counts.len() >= 2, "split requires >= 2 distinct hashes");

        let mut distinct: Vec<i64> = self.hash_counts.keys().copied().collect();
        distinct.sort_unstable();
        let pivot = distinct[distinct.len() / 2];

        let mut lower_ids = IdSet::with_capacity(self.ids.len());
        let mut lower_counts: HashMap<i64, usize> = HashMap::new();
        let mut upper_ids = IdSet::new();
        let mut upper_counts: HashMap<i64, usize> = HashMap::new();

        for id in self.ids.iter() {
            let h = extract_hash(id);
            if h < pivot {
                lower_ids.insert(id);
                *lower_counts.entry(h).or_insert(0) += 1;
            } else {
                upper_ids.insert(id);
                *upper_counts.entry(h).or_insert(0) += 1;
            }
        }

        self.ids = lower_ids;
        self.hash_counts = lower_counts;

        debug_assert!(!self.ids.is_empty(), "split must leave the lower partition non-empty");
        debug_assert!(!upper_ids.is_empty(), "split must produce a non-empty upper partition");

        (upper_counts, upper_ids)
    }

    /// Replaces this bucket's contents wholesale (used when installing the upper partition of
    /// a split into a freshly created `HashBucket`).
    pub fn install(&mut self, hash_counts: HashMap<i64, usize>, ids: IdSet) {
        self.hash_counts = hash_counts;
        self.ids = ids;
    }
}

/// A bucket holding exactly one value-hash, partitioned by true equality of the attribute value.
#[derive(Debug, Clone)]
pub struct DictBucket {
    val_hash: i64,
    values: HashMap<Value, IdSet>,
    len: usize,
}

impl DictBucket {
    /// Creates a new, empty `DictBucket` owning `val_hash`.
    pub fn new(val_hash: i64) -> Self {
        Self {
            val_hash,
            values: HashMap::new(),
            len: 0,
        }
    }

    /// The single value-hash this bucket owns.
    pub fn val_hash(&self) -> i64 {
        self.val_hash
    }

    /// Adds `object_id` under `value`.
    pub fn add(&mut self, value: Value, object_id: u64) {
        let ids = self.values.entry(value).or_insert_with(IdSet::new);
        if ids.insert(object_id) {
            self.len += 1;
        }
    }

    /// Removes `object_id` under `value`.
    ///
    /// # Errors
    /// Returns [`IndexError::NotPresent`] if `object_id` was not a member under `value`.
    pub fn remove(&mut self, value: &Value, object_id: u64) -> Result<()> {
        let Some(ids) = self.values.get_mut(value) else {
            return Err(IndexError::NotPresent);
        };
        if !ids.remove(object_id) {
            return Err(IndexError::NotPresent);
        }
        self.len -= 1;
        if ids.is_empty() {
            self.values.remove(value);
        }
        Ok(())
    }

    /// Returns the ids matching `value` exactly, or an empty set.
    pub fn matching_ids(&self, value: &Value) -> IdSet {
        self.values.get(value).cloned().unwrap_or_default()
    }

    /// Enumerates every held object-id across all values. Order is unspecified.
    pub fn all_ids(&self) -> Vec<u64> {
        self.values.values().flat_map(|s| s.iter()).collect()
    }

    /// Number of object-ids held (across all distinct values).
    pub fn size(&self) -> usize {
        self.len
    }

    /// Number of distinct attribute values held.
    pub fn distinct_value_count(&self) -> usize {
        self.values.len()
    }
}

/// The tagged union of bucket kinds an `AttributeIndex` stores.
#[derive(Debug, Clone)]
pub enum Bucket {
    /// Many distinct value-hashes.
    Hash(HashBucket),
    /// One value-hash, partitioned by equality.
    Dict(DictBucket),
}

impl Bucket {
    /// Creates a new, empty `HashBucket`-kind bucket.
    pub fn new_hash() -> Self {
        Bucket::Hash(HashBucket::new())
    }

    /// Number of object-ids held, regardless of kind.
    pub fn size(&self) -> usize {
        match self {
            Bucket::Hash(b) => b.size(),
            Bucket::Dict(b) => b.size(),
        }
    }

    /// Enumerates every held object-id, regardless of kind.
    pub fn all_ids(&self) -> Vec<u64> {
        match self {
            Bucket::Hash(b) => b.all_ids(),
            Bucket::Dict(b) => b.all_ids(),
        }
    }

    /// `true` if this is the `HashBucket` variant.
    pub fn is_hash(&self) -> bool {
        matches!(self, Bucket::Hash(_))
    }
}

/// Convenience: computes a value's routing hash. Re-exported at module level for callers that
/// only need the hash, not the full `Value` machinery.
pub fn hash_of(value: &Value) -> i64 {
    value_hash(value)
}
