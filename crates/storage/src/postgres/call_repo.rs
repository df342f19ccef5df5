//! Call table access for PostgreSQL.

use sqlx::{PgConnection, PgPool};

use strata_core::error::{StorageError, StorageResult};
use strata_core::models::Call;

use super::helpers::{address_to_column, column_to_address};

/// Write a call. Calls are never modified after insert.
pub async fn write_call(conn: &mut PgConnection, call: &Call) -> StorageResult<()> {
    let address = address_to_column(&call.address)?;

    sqlx::query(
        r#"
        INSERT INTO "call" (
            id, block_id, extrinsic_id, parent_id, address,
            pallet, name, args, success, error
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(&call.id)
    .bind(&call.block_id)
    .bind(&call.extrinsic_id)
    .bind(&call.parent_id)
    .bind(address)
    .bind(&call.pallet)
    .bind(&call.name)
    .bind(&call.args)
    .bind(call.success)
    .bind(&call.error)
    .execute(conn)
    .await
    .map_err(|e| StorageError::QueryError(e.to_string()))?;

    Ok(())
}

/// Load a call by id.
pub async fn fetch_call(pool: &PgPool, id: &str) -> StorageResult<Option<Call>> {
    let row = sqlx::query_as::<_, CallRow>(
        r#"
        SELECT id, block_id, extrinsic_id, parent_id, address,
               pallet, name, args, success, error
        FROM "call"
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::QueryError(e.to_string()))?;

    row.map(CallRow::into_call).transpose()
}

#[derive(sqlx::FromRow)]
struct CallRow {
    id: String,
    block_id: String,
    extrinsic_id: String,
    parent_id: Option<String>,
    address: Vec<i32>,
    pallet: String,
    name: String,
    args: Option<serde_json::Value>,
    success: bool,
    error: Option<serde_json::Value>,
}

impl CallRow {
    fn into_call(self) -> StorageResult<Call> {
        Ok(Call {
            id: self.id,
            block_id: self.block_id,
            extrinsic_id: self.extrinsic_id,
            parent_id: self.parent_id,
            address: column_to_address(self.address)?,
            pallet: self.pallet,
            name: self.name,
            args: self.args.unwrap_or(serde_json::Value::Null),
            success: self.success,
            error: self.error,
        })
    }
}
