//! Port trait for the store facade.
//!
//! The core relies on one ordering guarantee from implementations: a
//! `get` observes every `insert`/`upsert` previously issued through the
//! same store, whether or not it has been flushed yet.

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::models::{Entity, EntityKind, StoredEntity};

/// Entity store with write-ahead visibility.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new entity.
    ///
    /// Fails with [`StorageError::DuplicateId`] if an entity of the same
    /// kind and identity already exists.
    async fn insert(&self, entity: Entity) -> StorageResult<()>;

    /// Write the entity's current field values, creating or overwriting.
    async fn upsert(&self, entity: Entity) -> StorageResult<()>;

    /// Look up an entity by kind and identity.
    async fn get(&self, kind: EntityKind, id: &str) -> StorageResult<Option<Entity>>;

    /// Make buffered writes durable.
    async fn flush(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Typed helpers available on every [`Store`].
#[async_trait]
pub trait StoreExt: Store {
    async fn insert_entity<T: StoredEntity>(&self, entity: T) -> StorageResult<()> {
        self.insert(entity.into()).await
    }

    async fn upsert_entity<T: StoredEntity>(&self, entity: T) -> StorageResult<()> {
        self.upsert(entity.into()).await
    }

    /// Fetch an entity that must exist.
    ///
    /// Absence is [`StorageError::NotFound`], the referential-integrity error.
    async fn get_or_fail<T: StoredEntity>(&self, id: &str) -> StorageResult<T> {
        let entity = self
            .get(T::KIND, id)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })?;

        let found = entity.kind();
        T::from_entity(entity).ok_or_else(|| {
            StorageError::SerializationError(format!(
                "store returned {} for {} {}",
                found,
                T::KIND,
                id
            ))
        })
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
