//! Entity persistence.
//!
//! A [`Store`] maps `(kind, qualified name)` to a serialized entity. Two
//! implementations are provided:
//! - [`MemoryStore`]: an in-process map, for tests and programmatic entity
//!   sets.
//! - [`JsonStore`]: one pretty-printed JSON file per entity beneath
//!   `<cache>/store/`, addressed by the SHA-256 of the qualified name.

mod json;
mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::reflection::{Entity, EntityKind, ReflectionError};

/// Errors raised by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No entity with this kind and name is stored.
    #[error("{kind} not found in store: {name}")]
    NotFound { kind: EntityKind, name: String },

    /// File system failure while writing, reading or removing a record.
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stored record exists but cannot be decoded.
    #[error("malformed store record {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// Entity could not be encoded.
    #[error("failed to encode entity: {0}")]
    Reflection(#[from] ReflectionError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn not_found(kind: EntityKind, name: &str) -> Self {
        StoreError::NotFound {
            kind,
            name: name.to_string(),
        }
    }
}

/// Durable or in-memory entity storage.
pub trait Store {
    /// Insert or replace an entity. Entities failing
    /// [`Entity::validate`] are rejected.
    fn write(&mut self, entity: &Entity) -> StoreResult<()>;

    /// Read an entity by kind and qualified name.
    fn read(&self, kind: EntityKind, name: &str) -> StoreResult<Entity>;

    /// Remove an entity.
    fn remove(&mut self, kind: EntityKind, name: &str) -> StoreResult<()>;

    /// Every readable entity, sorted by kind and name.
    fn list_all(&self) -> StoreResult<Vec<Entity>>;

    /// Remove everything.
    fn clear(&mut self) -> StoreResult<()>;
}

/// Sort order used by `list_all` implementations.
pub(crate) fn sort_entities(entities: &mut [Entity]) {
    entities.sort_by(|a, b| (a.kind(), a.name()).cmp(&(b.kind(), b.name())));
}
