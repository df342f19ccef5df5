//! Block table access for PostgreSQL.

use sqlx::{PgConnection, PgPool};

use strata_core::error::{StorageError, StorageResult};
use strata_core::models::{Block, BlockHash};

use super::helpers::{bytes_to_hash32, fit};

/// Write a block, overwriting the counters of an existing row.
pub async fn write_block(conn: &mut PgConnection, block: &Block) -> StorageResult<()> {
    let height: i64 = fit(block.height, "block.height")?;
    let spec_version: i32 = fit(block.spec_version, "block.spec_version")?;
    let impl_version: i32 = fit(block.impl_version, "block.impl_version")?;
    let extrinsics_count: i32 = fit(block.extrinsics_count, "block.extrinsics_count")?;
    let calls_count: i32 = fit(block.calls_count, "block.calls_count")?;
    let events_count: i32 = fit(block.events_count, "block.events_count")?;

    sqlx::query(
        r#"
        INSERT INTO "block" (
            id, height, hash, parent_hash, extrinsics_root, state_root, timestamp,
            spec_name, spec_version, impl_name, impl_version, validator,
            extrinsics_count, calls_count, events_count
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (id) DO UPDATE SET
            extrinsics_count = EXCLUDED.extrinsics_count,
            calls_count = EXCLUDED.calls_count,
            events_count = EXCLUDED.events_count
        "#,
    )
    .bind(&block.id)
    .bind(height)
    .bind(&block.hash.0[..])
    .bind(&block.parent_hash.0[..])
    .bind(&block.extrinsics_root.0[..])
    .bind(&block.state_root.0[..])
    .bind(block.timestamp)
    .bind(&block.spec_name)
    .bind(spec_version)
    .bind(&block.impl_name)
    .bind(impl_version)
    .bind(&block.validator)
    .bind(extrinsics_count)
    .bind(calls_count)
    .bind(events_count)
    .execute(conn)
    .await
    .map_err(|e| StorageError::QueryError(e.to_string()))?;

    Ok(())
}

/// Load a block by id.
pub async fn fetch_block(pool: &PgPool, id: &str) -> StorageResult<Option<Block>> {
    let row = sqlx::query_as::<_, BlockRow>(
        r#"
        SELECT id, height, hash, parent_hash, extrinsics_root, state_root, timestamp,
               spec_name, spec_version, impl_name, impl_version, validator,
               extrinsics_count, calls_count, events_count
        FROM "block"
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::QueryError(e.to_string()))?;

    row.map(BlockRow::into_block).transpose()
}

/// Database row representation for Block.
#[derive(sqlx::FromRow)]
struct BlockRow {
    id: String,
    height: i64,
    hash: Vec<u8>,
    parent_hash: Vec<u8>,
    extrinsics_root: Vec<u8>,
    state_root: Vec<u8>,
    timestamp: chrono::DateTime<chrono::Utc>,
    spec_name: String,
    spec_version: i32,
    impl_name: String,
    impl_version: i32,
    validator: Option<Vec<u8>>,
    extrinsics_count: i32,
    calls_count: i32,
    events_count: i32,
}

impl BlockRow {
    fn into_block(self) -> StorageResult<Block> {
        Ok(Block {
            id: self.id,
            height: fit(self.height, "block.height")?,
            hash: BlockHash(bytes_to_hash32(self.hash, "block.hash")?),
            parent_hash: BlockHash(bytes_to_hash32(self.parent_hash, "block.parent_hash")?),
            extrinsics_root: BlockHash(bytes_to_hash32(
                self.extrinsics_root,
                "block.extrinsics_root",
            )?),
            state_root: BlockHash(bytes_to_hash32(self.state_root, "block.state_root")?),
            timestamp: self.timestamp,
            spec_name: self.spec_name,
            spec_version: fit(self.spec_version, "block.spec_version")?,
            impl_name: self.impl_name,
            impl_version: fit(self.impl_version, "block.impl_version")?,
            validator: self.validator,
            extrinsics_count: fit(self.extrinsics_count, "block.extrinsics_count")?,
            calls_count: fit(self.calls_count, "block.calls_count")?,
            events_count: fit(self.events_count, "block.events_count")?,
        })
    }
}
