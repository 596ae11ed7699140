//! In-memory store.

use std::collections::BTreeMap;

use super::{sort_entities, Store, StoreError, StoreResult};
use crate::reflection::{qualified_name, Entity, EntityKind};

/// Store backed by a map. Entities are cloned in and out.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entities: BTreeMap<(EntityKind, String), Entity>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert many entities at once, replacing same-named ones.
    pub fn set_entities<I>(&mut self, entities: I)
    where
        I: IntoIterator<Item = Entity>,
    {
        for entity in entities {
            self.entities
                .insert((entity.kind(), entity.name().to_string()), entity);
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Store for MemoryStore {
    fn write(&mut self, entity: &Entity) -> StoreResult<()> {
        entity.validate()?;
        self.entities
            .insert((entity.kind(), entity.name().to_string()), entity.clone());
        Ok(())
    }

    fn read(&self, kind: EntityKind, name: &str) -> StoreResult<Entity> {
        self.entities
            .get(&(kind, qualified_name(name).to_string()))
            .cloned()
            .ok_or_else(|| StoreError::not_found(kind, name))
    }

    fn remove(&mut self, kind: EntityKind, name: &str) -> StoreResult<()> {
        self.entities
            .remove(&(kind, qualified_name(name).to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(kind, name))
    }

    fn list_all(&self) -> StoreResult<Vec<Entity>> {
        let mut entities: Vec<Entity> = self.entities.values().cloned().collect();
        sort_entities(&mut entities);
        Ok(entities)
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.entities.clear();
        Ok(())
    }
}
