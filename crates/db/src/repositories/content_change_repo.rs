//! Repository for the `content_changes` table.

use folio_core::change::Change;
use folio_core::types::{ChangeId, PlanId, RecordId, Timestamp};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::change::ChangeRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, plan_id, action_index, table_name, record_id, action_type, \
    description, previous_data, new_data, reverted, reverted_at, created_at";

/// Provides persistence for the per-action change history.
pub struct ContentChangeRepo;

impl ContentChangeRepo {
    pub async fn create(pool: &PgPool, change: &Change) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO content_changes \
                (id, plan_id, action_index, table_name, record_id, action_type, \
                 description, previous_data, new_data, reverted, reverted_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(change.id)
        .bind(change.plan_id)
        .bind(change.action_index)
        .bind(&change.table_name)
        .bind(change.record_id)
        .bind(change.action_type.as_str())
        .bind(&change.description)
        .bind(change.previous_data.as_ref().map(Json))
        .bind(change.new_data.as_ref().map(Json))
        .bind(change.reverted)
        .bind(change.reverted_at)
        .bind(change.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(pool: &PgPool, id: ChangeId) -> Result<Option<ChangeRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM content_changes WHERE id = $1");
        sqlx::query_as::<_, ChangeRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All changes of a plan in execution order.
    pub async fn list_by_plan(pool: &PgPool, plan_id: PlanId) -> Result<Vec<ChangeRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_changes \
             WHERE plan_id = $1 \
             ORDER BY action_index ASC, created_at ASC"
        );
        sqlx::query_as::<_, ChangeRow>(&query)
            .bind(plan_id)
            .fetch_all(pool)
            .await
    }

    /// Claim an active change unless a claim newer than `stale_before` is
    /// held. Returns `false` when the claim was not taken.
    pub async fn claim(
        pool: &PgPool,
        id: ChangeId,
        at: Timestamp,
        stale_before: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE content_changes SET claimed_at = $2 \
             WHERE id = $1 AND reverted = FALSE \
               AND (claimed_at IS NULL OR claimed_at < $3)",
        )
        .bind(id)
        .bind(at)
        .bind(stale_before)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn release(pool: &PgPool, id: ChangeId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE content_changes SET claimed_at = NULL WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Flag an active change as reverted and release its claim. Returns
    /// `false` if it was not active.
    pub async fn mark_reverted(pool: &PgPool, id: ChangeId, at: Timestamp) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE content_changes SET reverted = TRUE, reverted_at = $2, claimed_at = NULL \
             WHERE id = $1 AND reverted = FALSE",
        )
        .bind(id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Point active changes on `from` in `table` at `to`. Returns the number
    /// of rows moved.
    pub async fn retarget(
        pool: &PgPool,
        table_name: &str,
        from: RecordId,
        to: RecordId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE content_changes SET record_id = $3 \
             WHERE table_name = $1 AND record_id = $2 AND reverted = FALSE",
        )
        .bind(table_name)
        .bind(from)
        .bind(to)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
