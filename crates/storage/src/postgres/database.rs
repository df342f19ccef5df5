//! Connection pool, schema migrations and purge.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, instrument};

use strata_core::error::{StorageError, StorageResult};

/// Pool settings for the single-writer indexer.
///
/// Linking is sequential, so one connection carries the flush transaction
/// and a second serves cache-miss reads.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// How long to wait for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 2,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle to the indexer database.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    #[instrument(skip_all, fields(max_connections = config.max_connections))]
    pub async fn connect(config: &DatabaseConfig) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;

        debug!("Connection pool created");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations from `crates/storage/migrations`.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::MigrationError(e.to_string()))?;

        debug!("Migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Delete every linked entity, keeping the schema.
    ///
    /// Counting and truncation run in one transaction, so the returned
    /// numbers are exactly what was removed.
    #[instrument(skip(self))]
    pub async fn purge(&self) -> StorageResult<PurgeStats> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        let (blocks, extrinsics, calls, events): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM "block"),
                (SELECT COUNT(*) FROM "extrinsic"),
                (SELECT COUNT(*) FROM "call"),
                (SELECT COUNT(*) FROM "event")
            "#,
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        // Every other entity table references "block"
        sqlx::query(r#"TRUNCATE "block" CASCADE"#)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        let stats = PurgeStats {
            blocks_removed: blocks.unsigned_abs(),
            extrinsics_removed: extrinsics.unsigned_abs(),
            calls_removed: calls.unsigned_abs(),
            events_removed: events.unsigned_abs(),
        };
        debug!(?stats, "Database purged");
        Ok(stats)
    }
}

/// Rows removed by [`Database::purge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeStats {
    pub blocks_removed: u64,
    pub extrinsics_removed: u64,
    pub calls_removed: u64,
    pub events_removed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_is_sized_for_one_writer() {
        let config = DatabaseConfig::new("postgres://db/strata");
        assert_eq!(config.url, "postgres://db/strata");
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
    }
}
