//! Write-ahead cache in front of the database.
//!
//! Holds every entity written since the last flush (pending) plus entities
//! read from the database (clean), so that reads see unflushed writes and
//! repeated parent lookups stay off the wire.

use std::collections::HashMap;

use strata_core::models::{Entity, EntityKind};

type EntityKey = (EntityKind, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    /// Matches the database.
    Clean,
    /// Must be written on the next flush.
    Pending,
}

#[derive(Debug)]
struct CacheEntry {
    entity: Entity,
    state: EntryState,
}

#[derive(Debug, Default)]
pub struct WriteCache {
    entries: HashMap<EntityKey, CacheEntry>,
    /// Pending keys in first-write order.
    order: Vec<EntityKey>,
}

impl WriteCache {
    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.entries.contains_key(&(kind, id.to_string()))
    }

    pub fn get(&self, kind: EntityKind, id: &str) -> Option<&Entity> {
        self.entries.get(&(kind, id.to_string())).map(|e| &e.entity)
    }

    /// Keep an entity loaded from the database. Never replaces a cached value.
    pub fn remember(&mut self, entity: Entity) {
        let key = (entity.kind(), entity.id().to_string());
        self.entries.entry(key).or_insert(CacheEntry {
            entity,
            state: EntryState::Clean,
        });
    }

    /// Record a write to be flushed.
    pub fn stage(&mut self, entity: Entity) {
        let key = (entity.kind(), entity.id().to_string());
        let was_pending = self
            .entries
            .get(&key)
            .is_some_and(|e| e.state == EntryState::Pending);
        if !was_pending {
            self.order.push(key.clone());
        }
        self.entries.insert(
            key,
            CacheEntry {
                entity,
                state: EntryState::Pending,
            },
        );
    }

    /// Pending entities, in the order they were first written.
    pub fn pending(&self) -> impl Iterator<Item = &Entity> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key))
            .map(|e| &e.entity)
    }

    pub fn pending_len(&self) -> usize {
        self.order.len()
    }

    /// Drop everything after a successful flush.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
