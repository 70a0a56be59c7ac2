//! Error types for the index crate.
//!
//! Modeled on `alloc::allocator::AllocError` in the original `halo` teacher crate: a small,
//! hand-written enum with manual `Display` and `std::error::Error` impls rather than a
//! derive-macro error crate, since that is the only error-handling convention this crate's
//! lineage actually established.

use std::fmt;

/// Errors that can be returned by index operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// A query (`match` or `exclude`) referenced an attribute that was never registered.
    UnknownAttribute(String),
    /// `remove` or `update` was called on an object that is not currently in the set.
    MissingObject,
    /// Internal: a bucket was asked to remove an id it does not hold. Never escapes past
    /// `IndexSet`, which always checks membership first; kept as a distinct variant so bucket
    /// code can report it precisely to its caller within the crate.
    NotPresent,
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::UnknownAttribute(name) => {
                write!(f, "unknown attribute: {name:?}")
            }
            IndexError::MissingObject => write!(f, "object is not present in the index"),
            IndexError::NotPresent => write!(f, "id is not present in the bucket"),
        }
    }
}

impl std::error::Error for IndexError {}

/// Convenience alias for fallible index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

pub(crate) fn unknown_attribute(name: &str) -> IndexError {
    tracing::warn!(attribute = name, "query referenced an unregistered attribute");
    IndexError::UnknownAttribute(name.to_string())
}

pub(crate) fn missing_object() -> IndexError {
    tracing::warn!("remove/update called on an object not present in the index");
    IndexError::MissingObject
}
