//! # `hashindex` - an in-memory, multi-attribute inverted index
//!
//! Index an arbitrary collection of objects by one or more attributes and query them with
//! equality (and list-of-values "any of") constraints, combined with set intersection
//! (`match`) and difference (`exclude`). Insertion, removal, and attribute update are all
//! supported while the index is live.
//!
//! ## Architecture
//!
//! - [`index::bucket`]: the leaf storage. A `HashBucket` holds many distinct value-hashes; a
//!   `DictBucket` holds one value-hash, partitioned by equality of the underlying value.
//! - [`index::attribute_index::AttributeIndex`]: an ordered map from a lower hash bound to a
//!   bucket, with routing and automatic rebalancing (split / convert-to-dict) as buckets grow.
//! - [`index::index_set::IndexSet`]: owns the shared object table and one `AttributeIndex` per
//!   registered attribute; the public entry point most callers use.
//!
//! ## Example
//!
//! ```rust
//! use hashindex::{Attribute, FieldAccess, IndexSet, Value};
//! use std::collections::HashMap;
//!
//! #[derive(Clone)]
//! struct Planet {
//!     name: &'static str,
//!     size: i64,
//! }
//!
//! impl FieldAccess for Planet {
//!     fn field(&self, name: &str) -> Value {
//!         match name {
//!             "planet" => Value::str(self.name),
//!             "size" => Value::Int(self.size),
//!             _ => Value::Missing,
//!         }
//!     }
//! }
//!
//! let mut set = IndexSet::new(
//!     [Planet { name: "mars", size: 8 }, Planet { name: "earth", size: 4 }],
//!     [Attribute::named("planet"), Attribute::named("size")],
//! );
//! set.add(Planet { name: "mars", size: 8 });
//!
//! let mut query = HashMap::new();
//! query.insert("planet".to_string(), Value::str("mars").into());
//! let mars = set.find(Some(&query), None).unwrap();
//! assert_eq!(mars.len(), 2);
//! ```

#![warn(missing_docs, clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod index;

pub use index::{
    Attribute, AttributeIndex, FieldAccess, IdSet, IndexError, IndexSet, IndexSetBuilder,
    MatchValue, Query, Result, Value, DEFAULT_SIZE_THRESH, HASH_MIN,
};
