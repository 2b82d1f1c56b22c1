//! Repository for the `admin_activity` table.

use folio_core::activity::ActivityEvent;
use folio_core::types::PlanId;
use sqlx::PgPool;

use crate::models::activity::ActivityRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, event_type, plan_id, change_id, actor, payload, created_at";

/// Provides append and read access to the admin activity log.
pub struct ActivityRepo;

impl ActivityRepo {
    /// Append an event, returning the generated row id.
    pub async fn insert(pool: &PgPool, event: &ActivityEvent) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO admin_activity \
                (event_type, plan_id, change_id, actor, payload, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(event.kind.as_str())
        .bind(event.plan_id)
        .bind(event.change_id)
        .bind(&event.actor)
        .bind(&event.payload)
        .bind(event.at)
        .fetch_one(pool)
        .await
    }

    /// Activity of one plan, oldest first.
    pub async fn list_by_plan(pool: &PgPool, plan_id: PlanId) -> Result<Vec<ActivityRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM admin_activity WHERE plan_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, ActivityRow>(&query)
            .bind(plan_id)
            .fetch_all(pool)
            .await
    }

    /// Most recent activity across all plans, newest first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<ActivityRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM admin_activity ORDER BY id DESC LIMIT $1");
        sqlx::query_as::<_, ActivityRow>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
