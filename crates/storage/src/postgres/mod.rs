//! PostgreSQL storage adapter.
//!
//! This module implements the [`Store`] port on top of PostgreSQL.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool, migrations and purge
//! - [`PgStore`] - Store facade with a write-ahead cache; writes reach the
//!   database on [`Store::flush`], all at once, in one transaction
//! - Per-table access functions in `block_repo`, `extrinsic_repo`, etc.
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::new(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let store = PgStore::new(&db);
//! ```

mod block_repo;
mod cache;
mod call_repo;
mod database;
mod event_repo;
mod extrinsic_repo;
mod helpers;

pub use database::{Database, DatabaseConfig, PurgeStats};

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use strata_core::error::{StorageError, StorageResult};
use strata_core::models::{Entity, EntityKind};
use strata_core::ports::Store;

use cache::WriteCache;

// =============================================================================
// PgStore
// =============================================================================

/// PostgreSQL-backed [`Store`] with a write-ahead cache.
///
/// Inserts and upserts are staged in memory and visible to `get`
/// immediately. `flush` writes staged entities in first-write order inside
/// one transaction. Duplicate ids are rejected when `insert` is called,
/// against both the cache and the database.
pub struct PgStore {
    pool: PgPool,
    cache: Mutex<WriteCache>,
}

impl PgStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            cache: Mutex::new(WriteCache::default()),
        }
    }

    async fn exists(&self, kind: EntityKind, id: &str) -> StorageResult<bool> {
        // Table names come from the closed EntityKind enum, never from input.
        let query = format!(
            r#"SELECT EXISTS(SELECT 1 FROM "{}" WHERE id = $1)"#,
            kind.as_str()
        );
        let row: (bool,) = sqlx::query_as(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(row.0)
    }

    async fn load(&self, kind: EntityKind, id: &str) -> StorageResult<Option<Entity>> {
        let entity = match kind {
            EntityKind::Block => block_repo::fetch_block(&self.pool, id)
                .await?
                .map(Entity::Block),
            EntityKind::Extrinsic => extrinsic_repo::fetch_extrinsic(&self.pool, id)
                .await?
                .map(Entity::Extrinsic),
            EntityKind::Call => call_repo::fetch_call(&self.pool, id)
                .await?
                .map(Entity::Call),
            EntityKind::Event => event_repo::fetch_event(&self.pool, id)
                .await?
                .map(Entity::Event),
        };
        Ok(entity)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert(&self, entity: Entity) -> StorageResult<()> {
        let mut cache = self.cache.lock().await;
        let kind = entity.kind();

        if cache.contains(kind, entity.id()) || self.exists(kind, entity.id()).await? {
            return Err(StorageError::DuplicateId {
                kind,
                id: entity.id().to_string(),
            });
        }

        cache.stage(entity);
        Ok(())
    }

    async fn upsert(&self, entity: Entity) -> StorageResult<()> {
        self.cache.lock().await.stage(entity);
        Ok(())
    }

    async fn get(&self, kind: EntityKind, id: &str) -> StorageResult<Option<Entity>> {
        let mut cache = self.cache.lock().await;
        if let Some(entity) = cache.get(kind, id) {
            return Ok(Some(entity.clone()));
        }

        let loaded = self.load(kind, id).await?;
        if let Some(entity) = &loaded {
            cache.remember(entity.clone());
        }
        Ok(loaded)
    }

    #[instrument(skip(self))]
    async fn flush(&self) -> StorageResult<()> {
        let mut cache = self.cache.lock().await;
        if cache.pending_len() == 0 {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        for entity in cache.pending() {
            match entity {
                Entity::Block(block) => block_repo::write_block(&mut *tx, block).await?,
                Entity::Extrinsic(ext) => extrinsic_repo::write_extrinsic(&mut *tx, ext).await?,
                Entity::Call(call) => call_repo::write_call(&mut *tx, call).await?,
                Entity::Event(event) => event_repo::write_event(&mut *tx, event).await?,
            }
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        debug!(written = cache.pending_len(), "Flushed pending entities");
        cache.clear();
        Ok(())
    }
}
