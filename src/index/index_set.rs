//! `IndexSet` — the multi-attribute orchestrator (spec §4.3).
//!
//! Owns the shared [`ObjectTable`] and one [`AttributeIndex`] per registered attribute. Ported
//! from the Python original's `HashIndex` (`examples/original_source/hashindex/mutable.py`):
//! `add`/`remove`/`update` keep the object table and every attribute index in lockstep, and
//! `find`/`find_ids` combine per-attribute id-sets with the intersect-smaller-into-larger
//! heuristic and early short-circuiting on an empty intermediate result.

use std::collections::HashMap;

use super::attribute::{Attribute, FieldAccess};
use super::attribute_index::{AttributeIndex, DEFAULT_SIZE_THRESH};
use super::error::{missing_object, unknown_attribute, Result};
use super::id_set::IdSet;
use super::object_table::ObjectTable;
use super::value::Value;

/// A query value: either a single `Value` to match, or a list of values to match any of
/// (union), matching the spec's `{attr -> value | [value, ...]}` query shape (§6).
#[derive(Debug, Clone)]
pub enum MatchValue {
    /// Match objects whose attribute equals this one value.
    One(Value),
    /// Match objects whose attribute equals any of these values (union).
    AnyOf(Vec<Value>),
}

impl From<Value> for MatchValue {
    fn from(v: Value) -> Self {
        MatchValue::One(v)
    }
}

impl From<Vec<Value>> for MatchValue {
    fn from(vs: Vec<Value>) -> Self {
        MatchValue::AnyOf(vs)
    }
}

/// A query: `{attribute key -> value-or-values}`. An absent or empty map means "no constraint".
pub type Query = HashMap<String, MatchValue>;

/// Builds an [`IndexSet`], optionally pre-loading an initial population of objects. When objects
/// are supplied up front, each attribute's bucket layout is computed directly from the whole
/// population (sort by hash, chunk into `size_thresh`-sized runs) rather than grown one insert
/// and one split at a time (spec §4.3, §10.5's "bucket plan" note).
pub struct IndexSetBuilder<O> {
    attributes: Vec<Attribute<O>>,
    size_thresh: usize,
}

impl<O: FieldAccess> IndexSetBuilder<O> {
    /// Creates a builder with no attributes registered yet.
    pub fn new() -> Self {
        Self {
            attributes: Vec::new(),
            size_thresh: DEFAULT_SIZE_THRESH,
        }
    }

    /// Registers an attribute to be indexed.
    pub fn attribute(mut self, attribute: Attribute<O>) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Overrides the `HashBucket` rebalancing threshold (default [`DEFAULT_SIZE_THRESH`]).
    pub fn size_thresh(mut self, size_thresh: usize) -> Self {
        self.size_thresh = size_thresh;
        self
    }

    /// Builds the `IndexSet`: loads `objects` into the object table first, then builds each
    /// attribute's index directly from that whole population via [`AttributeIndex::bulk_load`],
    /// rather than inserting into an empty index one object (and one incremental rebalance) at a
    /// time.
    pub fn build(self, objects: impl IntoIterator<Item = O>) -> IndexSet<O> {
        let mut table = ObjectTable::new();
        for obj in objects {
            table.insert(obj);
        }

        let indices = self
            .attributes
            .into_iter()
            .map(|attr| {
                let entries: Vec<(u64, Value)> =
                    table.iter().map(|(id, obj)| (id, attr.extract(obj))).collect();
                let key = attr.key().to_string();
                (key, AttributeIndex::bulk_load(attr, self.size_thresh, entries))
            })
            .collect();

        IndexSet { objects: table, indices }
    }
}

impl<O: FieldAccess> Default for IndexSetBuilder<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// The multi-attribute inverted index.
pub struct IndexSet<O> {
    objects: ObjectTable<O>,
    indices: HashMap<String, AttributeIndex<O>>,
}

impl<O: FieldAccess> IndexSet<O> {
    /// Creates an index over `objects`, with one `AttributeIndex` per attribute in `on`.
    pub fn new(objects: impl IntoIterator<Item = O>, on: impl IntoIterator<Item = Attribute<O>>) -> Self {
        let mut builder = IndexSetBuilder::new();
        for attr in on {
            builder = builder.attribute(attr);
        }
        builder.build(objects)
    }

    /// Starts building an `IndexSet` with explicit configuration.
    pub fn builder() -> IndexSetBuilder<O> {
        IndexSetBuilder::new()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// `true` if the set holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// `true` if `object_id` is a member of the set.
    pub fn contains(&self, object_id: u64) -> bool {
        self.objects.get(object_id).is_some()
    }

    /// Borrows the object stored under `object_id`, if present.
    pub fn get(&self, object_id: u64) -> Option<&O> {
        self.objects.get(object_id)
    }

    /// Iterates over every `(id, &object)` pair currently in the set. Order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &O)> {
        self.objects.iter()
    }

    /// Inserts `object`, updating every registered attribute index. Returns the freshly
    /// allocated object-id.
    pub fn add(&mut self, object: O) -> u64 {
        let id = self.objects.insert(object);
        let obj = self.objects.get(id).expect("just inserted");
        for index in self.indices.values_mut() {
            index.add(id, obj, &self.objects);
        }
        id
    }

    /// Removes the object stored under `object_id` from the set and every attribute index.
    ///
    /// # Errors
    /// Returns [`super::error::IndexError::MissingObject`] if `object_id` is not present.
    pub fn remove(&mut self, object_id: u64) -> Result<O> {
        let Some(obj) = self.objects.get(object_id) else {
            return Err(missing_object());
        };
        for index in self.indices.values_mut() {
            index
                .remove(object_id, obj)
                .expect("object_id must be a member of every attribute index it was added to");
        }
        Ok(self.objects.remove(object_id).expect("checked present above"))
    }

    /// Replaces the object stored under `object_id` with `new_object`, equivalent to
    /// `remove` + `add` under the same attribute indices (spec §4.3). The object-id is *not*
    /// preserved across an update -- a fresh id is allocated for the re-added object, matching
    /// this crate's id-allocation model (§9); callers that need a stable handle should key off
    /// the object's own fields, not the id.
    ///
    /// # Errors
    /// Returns [`super::error::IndexError::MissingObject`] if `object_id` is not present.
    pub fn update(&mut self, object_id: u64, new_object: O) -> Result<u64> {
        self.remove(object_id)?;
        Ok(self.add(new_object))
    }

    /// Resolves a single attribute/value(s) pair into an id-set, unioning across a list of
    /// values (spec §4.2 `_match_any_of`).
    fn match_any_of(&self, attr: &str, value: &MatchValue) -> IdSet {
        let index = &self.indices[attr];
        match value {
            MatchValue::One(v) => index.get_ids(v, &self.objects),
            MatchValue::AnyOf(values) => {
                let mut acc = IdSet::new();
                for v in values {
                    acc = acc.union(&index.get_ids(v, &self.objects));
                }
                acc
            }
        }
    }

    /// Computes the id-set matching `match_` (AND across attributes, OR within a list of
    /// values) with `exclude` subtracted off (spec §4.2).
    ///
    /// # Errors
    /// Returns [`super::error::IndexError::UnknownAttribute`] if `match_` or `exclude`
    /// reference an attribute that was never registered.
    pub fn find_ids(&self, match_: Option<&Query>, exclude: Option<&Query>) -> Result<IdSet> {
        for attr in match_.into_iter().flatten().map(|(k, _)| k).chain(exclude.into_iter().flatten().map(|(k, _)| k)) {
            if !self.indices.contains_key(attr) {
                return Err(unknown_attribute(attr));
            }
        }

        let mut hits = match match_ {
            None => IdSet::from_iter(self.objects.ids()),
            Some(m) if m.is_empty() => IdSet::from_iter(self.objects.ids()),
            Some(m) => {
                let mut hits: Option<IdSet> = None;
                for (attr, value) in m {
                    let field_hits = self.match_any_of(attr, value);
                    hits = Some(match hits {
                        None => field_hits,
                        Some(running) => running.intersection(&field_hits),
                    });
                    if hits.as_ref().unwrap().is_empty() {
                        break;
                    }
                }
                hits.unwrap_or_default()
            }
        };

        if let Some(ex) = exclude {
            for (attr, value) in ex {
                if hits.is_empty() {
                    break;
                }
                let field_hits = self.match_any_of(attr, value);
                hits = hits.difference(&field_hits);
            }
        }

        Ok(hits)
    }

    /// Materializes [`IndexSet::find_ids`] into the matching objects.
    ///
    /// # Errors
    /// As [`IndexSet::find_ids`].
    pub fn find(&self, match_: Option<&Query>, exclude: Option<&Query>) -> Result<Vec<&O>> {
        let ids = self.find_ids(match_, exclude)?;
        Ok(ids.iter().map(|id| self.objects.get(id).expect("id-set only holds live ids")).collect())
    }
}
