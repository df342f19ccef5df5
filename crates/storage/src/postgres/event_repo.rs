//! Event table access for PostgreSQL.

use sqlx::{PgConnection, PgPool};

use strata_core::error::{StorageError, StorageResult};
use strata_core::models::Event;

use super::helpers::fit;

/// Write an event. Events are never modified after insert.
pub async fn write_event(conn: &mut PgConnection, event: &Event) -> StorageResult<()> {
    let block_number: i64 = fit(event.block_number, "event.block_number")?;
    let index: i32 = fit(event.index, "event.index")?;

    sqlx::query(
        r#"
        INSERT INTO "event" (
            id, block_id, block_number, extrinsic_id, call_id, index,
            phase, pallet, name, args, args_str
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(&event.id)
    .bind(&event.block_id)
    .bind(block_number)
    .bind(&event.extrinsic_id)
    .bind(&event.call_id)
    .bind(index)
    .bind(&event.phase)
    .bind(&event.pallet)
    .bind(&event.name)
    .bind(&event.args)
    .bind(&event.args_str)
    .execute(conn)
    .await
    .map_err(|e| StorageError::QueryError(e.to_string()))?;

    Ok(())
}

/// Load an event by id.
pub async fn fetch_event(pool: &PgPool, id: &str) -> StorageResult<Option<Event>> {
    let row = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, block_id, block_number, extrinsic_id, call_id, index,
               phase, pallet, name, args, args_str
        FROM "event"
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::QueryError(e.to_string()))?;

    row.map(EventRow::into_event).transpose()
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(sqlx::FromRow)]
struct EventRow {
    id: String,
    block_id: String,
    block_number: i64,
    extrinsic_id: Option<String>,
    call_id: Option<String>,
    index: i32,
    phase: String,
    pallet: String,
    name: String,
    args: Option<serde_json::Value>,
    args_str: Vec<String>,
}

impl EventRow {
    fn into_event(self) -> StorageResult<Event> {
        Ok(Event {
            id: self.id,
            block_id: self.block_id,
            block_number: fit(self.block_number, "event.block_number")?,
            extrinsic_id: self.extrinsic_id,
            call_id: self.call_id,
            index: fit(self.index, "event.index")?,
            phase: self.phase,
            pallet: self.pallet,
            name: self.name,
            args: self.args.unwrap_or(serde_json::Value::Null),
            args_str: self.args_str,
        })
    }
}
