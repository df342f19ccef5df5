//! In-memory store.
//!
//! Writes are visible immediately and there is nothing to flush. Besides
//! backing dry runs, it keeps the order in which entities were inserted,
//! which is what the ordering guarantees of the linker are checked against.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use strata_core::error::{StorageError, StorageResult};
use strata_core::models::{Entity, EntityKind, StoredEntity};
use strata_core::ports::Store;

type EntityKey = (EntityKind, String);

#[derive(Default)]
struct MemoryState {
    entities: HashMap<EntityKey, Entity>,
    inserted: Vec<EntityKey>,
    flushes: usize,
}

/// [`Store`] backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every successful insert, oldest first.
    pub fn inserted(&self) -> Vec<(EntityKind, String)> {
        self.state.lock().inserted.clone()
    }

    /// Current values of all entities of one kind, in insertion order.
    pub fn all<T: StoredEntity>(&self) -> Vec<T> {
        let state = self.state.lock();
        state
            .inserted
            .iter()
            .filter(|(kind, _)| *kind == T::KIND)
            .filter_map(|key| state.entities.get(key).cloned())
            .filter_map(T::from_entity)
            .collect()
    }

    /// Number of stored entities of one kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.state
            .lock()
            .entities
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// How many times [`Store::flush`] was called.
    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, entity: Entity) -> StorageResult<()> {
        let mut state = self.state.lock();
        let key = (entity.kind(), entity.id().to_string());
        if state.entities.contains_key(&key) {
            let (kind, id) = key;
            return Err(StorageError::DuplicateId { kind, id });
        }
        state.inserted.push(key.clone());
        state.entities.insert(key, entity);
        Ok(())
    }

    async fn upsert(&self, entity: Entity) -> StorageResult<()> {
        let mut state = self.state.lock();
        let key = (entity.kind(), entity.id().to_string());
        if !state.entities.contains_key(&key) {
            state.inserted.push(key.clone());
        }
        state.entities.insert(key, entity);
        Ok(())
    }

    async fn get(&self, kind: EntityKind, id: &str) -> StorageResult<Option<Entity>> {
        Ok(self
            .state
            .lock()
            .entities
            .get(&(kind, id.to_string()))
            .cloned())
    }

    async fn flush(&self) -> StorageResult<()> {
        self.state.lock().flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::models::Call;
    use strata_core::ports::StoreExt;

    fn call(id: &str) -> Call {
        Call {
            id: id.into(),
            block_id: "b".into(),
            extrinsic_id: "x".into(),
            parent_id: None,
            address: vec![],
            pallet: "System".into(),
            name: "remark".into(),
            args: serde_json::Value::Null,
            success: true,
            error: None,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_identity() {
        let store = MemoryStore::new();
        store.insert_entity(call("c")).await.unwrap();

        let err = store.insert_entity(call("c")).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateId { kind: EntityKind::Call, ref id } if id == "c"));
        assert_eq!(store.count(EntityKind::Call), 1);
    }

    #[tokio::test]
    async fn upsert_overwrites_without_touching_trace_order() {
        let store = MemoryStore::new();
        store.insert_entity(call("a")).await.unwrap();
        store.insert_entity(call("b")).await.unwrap();

        let mut a = call("a");
        a.success = false;
        store.upsert_entity(a).await.unwrap();

        let calls: Vec<Call> = store.all();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "a");
        assert!(!calls[0].success);
        assert_eq!(
            store.inserted(),
            vec![(EntityKind::Call, "a".to_string()), (EntityKind::Call, "b".to_string())]
        );
    }

    #[tokio::test]
    async fn get_or_fail_reports_missing_reference() {
        let store = MemoryStore::new();
        let err = store.get_or_fail::<Call>("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { kind: EntityKind::Call, .. }));
    }

    #[tokio::test]
    async fn same_id_different_kind_is_distinct() {
        let store = MemoryStore::new();
        store.insert_entity(call("shared")).await.unwrap();
        assert!(store.get(EntityKind::Event, "shared").await.unwrap().is_none());
    }
}
