//! Extrinsic table access for PostgreSQL.

use sqlx::{PgConnection, PgPool};

use strata_core::error::{StorageError, StorageResult};
use strata_core::models::{Extrinsic, ExtrinsicHash, ExtrinsicSignature};

use super::helpers::{bytes_to_hash32, fit, text_to_amount};

/// Write an extrinsic; an existing row only has its root call updated.
pub async fn write_extrinsic(conn: &mut PgConnection, ext: &Extrinsic) -> StorageResult<()> {
    let signature = ext
        .signature
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| StorageError::SerializationError(format!("extrinsic.signature: {}", e)))?;
    let index: i32 = fit(ext.index, "extrinsic.index")?;
    let version: i32 = fit(ext.version, "extrinsic.version")?;

    sqlx::query(
        r#"
        INSERT INTO "extrinsic" (
            id, block_id, index, hash, signature, success, error,
            fee, tip, version, call_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8::NUMERIC, $9::NUMERIC, $10, $11)
        ON CONFLICT (id) DO UPDATE SET
            call_id = EXCLUDED.call_id
        "#,
    )
    .bind(&ext.id)
    .bind(&ext.block_id)
    .bind(index)
    .bind(&ext.hash.0[..])
    .bind(signature)
    .bind(ext.success)
    .bind(&ext.error)
    .bind(ext.fee.map(|f| f.to_string()))
    .bind(ext.tip.map(|t| t.to_string()))
    .bind(version)
    .bind(&ext.call_id)
    .execute(conn)
    .await
    .map_err(|e| StorageError::QueryError(e.to_string()))?;

    Ok(())
}

/// Load an extrinsic by id.
pub async fn fetch_extrinsic(pool: &PgPool, id: &str) -> StorageResult<Option<Extrinsic>> {
    let row = sqlx::query_as::<_, ExtrinsicRow>(
        r#"
        SELECT id, block_id, index, hash, signature, success, error,
               fee::TEXT AS fee, tip::TEXT AS tip, version, call_id
        FROM "extrinsic"
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::QueryError(e.to_string()))?;

    row.map(ExtrinsicRow::into_extrinsic).transpose()
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(sqlx::FromRow)]
struct ExtrinsicRow {
    id: String,
    block_id: String,
    index: i32,
    hash: Vec<u8>,
    signature: Option<serde_json::Value>,
    success: bool,
    error: Option<serde_json::Value>,
    fee: Option<String>,
    tip: Option<String>,
    version: i32,
    call_id: Option<String>,
}

impl ExtrinsicRow {
    fn into_extrinsic(self) -> StorageResult<Extrinsic> {
        let signature = self
            .signature
            .map(serde_json::from_value::<ExtrinsicSignature>)
            .transpose()
            .map_err(|e| StorageError::SerializationError(format!("extrinsic.signature: {}", e)))?;

        Ok(Extrinsic {
            hash: ExtrinsicHash(bytes_to_hash32(self.hash, "extrinsic.hash")?),
            fee: text_to_amount(self.fee, "extrinsic.fee")?,
            tip: text_to_amount(self.tip, "extrinsic.tip")?,
            id: self.id,
            block_id: self.block_id,
            index: fit(self.index, "extrinsic.index")?,
            signature,
            success: self.success,
            error: self.error,
            version: fit(self.version, "extrinsic.version")?,
            call_id: self.call_id,
        })
    }
}
