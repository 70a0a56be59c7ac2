//! Attribute keys and extractors (spec §3, §6).
//!
//! An attribute is either a **name**, extracted from an object via the [`FieldAccess`] trait, or
//! an arbitrary **projection** closure. Both forms produce a [`Value`]. This mirrors the
//! original Python system's duck-typed `get_field(obj, field)`, which either does a `getattr`/
//! dict lookup (name) or calls `field(obj)` (projection) -- reimagined here as a small trait
//! object, in the same style this crate's lineage uses for pluggable per-call behavior (e.g.
//! `alloc::allocator::GhostAlloc`).

use std::sync::Arc;

use super::value::Value;

/// Implemented by object types that support named-field attribute extraction.
///
/// For a `struct`, this is typically a `match` over known field names; for a map-like type
/// (`HashMap<String, Value>`), it is a direct lookup. Returns [`Value::Missing`] for unknown
/// field names, never an error -- a missing field is a valid, indexable attribute value (spec
/// §3, §4.2 tie-breaks).
pub trait FieldAccess {
    /// Extracts the named field's value, or `Value::Missing` if absent.
    fn field(&self, name: &str) -> Value;
}

/// An attribute extractor: a name (for `FieldAccess` objects) or an arbitrary projection.
#[derive(Clone)]
enum Extractor<O> {
    Named,
    Projection(Arc<dyn Fn(&O) -> Value + Send + Sync>),
}

/// A registered attribute: a key used for map lookups plus the extraction logic.
#[derive(Clone)]
pub struct Attribute<O> {
    key: String,
    extractor: Extractor<O>,
}

impl<O: FieldAccess> Attribute<O> {
    /// An attribute extracted by named field access (`FieldAccess::field`).
    pub fn named(name: impl Into<String>) -> Self {
        let key = name.into();
        Self {
            key,
            extractor: Extractor::Named,
        }
    }
}

impl<O> Attribute<O> {
    /// An attribute extracted by an arbitrary projection function.
    ///
    /// `key` is the name this attribute is registered and queried under; unlike the Python
    /// original (which can use the function object itself as a hashable dict key), Rust
    /// closures have no portable identity to key a map by, so a caller-supplied string key is
    /// required here.
    pub fn projection(
        key: impl Into<String>,
        extract: impl Fn(&O) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            extractor: Extractor::Projection(Arc::new(extract)),
        }
    }

    /// The attribute's registration key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<O: FieldAccess> Attribute<O> {
    /// Extracts this attribute's value from `object`.
    pub fn extract(&self, object: &O) -> Value {
        match &self.extractor {
            Extractor::Named => object.field(&self.key),
            Extractor::Projection(f) => f(object),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Record(HashMap<String, Value>);

    impl FieldAccess for Record {
        fn field(&self, name: &str) -> Value {
            self.0.get(name).cloned().unwrap_or(Value::Missing)
        }
    }

    #[test]
    fn named_extraction() {
        let mut fields = HashMap::new();
        fields.insert("planet".to_string(), Value::str("mars"));
        let r = Record(fields);
        let attr = Attribute::named("planet");
        assert_eq!(attr.extract(&r), Value::str("mars"));
    }

    #[test]
    fn named_extraction_missing_field() {
        let r = Record(HashMap::new());
        let attr = Attribute::named("planet");
        assert_eq!(attr.extract(&r), Value::Missing);
    }

    #[test]
    fn projection_extraction() {
        let r = Record(HashMap::new());
        let attr: Attribute<Record> = Attribute::projection("const", |_| Value::Int(42));
        assert_eq!(attr.extract(&r), Value::Int(42));
        assert_eq!(attr.key(), "const");
    }
}
