//! The multi-attribute inverted index (spec §2).
//!
//! Three layers, leaves first: [`bucket`] (the two bucket kinds), [`attribute_index`] (the
//! per-attribute ordered bucket map with routing and rebalancing), and [`index_set`] (the
//! orchestrator owning the shared object table and one `AttributeIndex` per attribute).

pub mod attribute;
pub mod attribute_index;
pub mod bucket;
pub mod error;
pub mod id_set;
pub mod index_set;
pub mod object_table;
pub mod value;

pub use attribute::{Attribute, FieldAccess};
pub use attribute_index::{AttributeIndex, BucketReportEntry, DEFAULT_SIZE_THRESH, HASH_MIN};
pub use error::{IndexError, Result};
pub use id_set::IdSet;
pub use index_set::{IndexSet, IndexSetBuilder, MatchValue, Query};
pub use object_table::ObjectTable;
pub use value::Value;
