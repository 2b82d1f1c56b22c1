//! Repository for the `content_plans` table.

use folio_core::plan::{ContentPlan, PlanStatus};
use folio_core::types::{PlanId, Timestamp};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::plan::PlanRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, summary, actions, status, created_at, executed_at, reverted_at";

/// Provides persistence for content plans and their status transitions.
pub struct ContentPlanRepo;

impl ContentPlanRepo {
    /// Insert a plan exactly as given, including its id and status.
    pub async fn create(pool: &PgPool, plan: &ContentPlan) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO content_plans \
                (id, title, summary, actions, status, created_at, executed_at, reverted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(plan.id)
        .bind(&plan.title)
        .bind(&plan.summary)
        .bind(Json(&plan.actions))
        .bind(plan.status.as_str())
        .bind(plan.created_at)
        .bind(plan.executed_at)
        .bind(plan.reverted_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(pool: &PgPool, id: PlanId) -> Result<Option<PlanRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM content_plans WHERE id = $1");
        sqlx::query_as::<_, PlanRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List plans, newest first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<PlanRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_plans \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, PlanRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Plans still `proposed` that already own change rows, newest first.
    pub async fn list_orphaned(pool: &PgPool) -> Result<Vec<PlanRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_plans p \
             WHERE p.status = 'proposed' \
               AND EXISTS (SELECT 1 FROM content_changes c WHERE c.plan_id = p.id) \
             ORDER BY p.created_at DESC"
        );
        sqlx::query_as::<_, PlanRow>(&query).fetch_all(pool).await
    }

    /// Claim a plan in `status` unless a claim newer than `stale_before`
    /// is held. Returns `false` when the claim was not taken.
    pub async fn claim(
        pool: &PgPool,
        id: PlanId,
        status: PlanStatus,
        at: Timestamp,
        stale_before: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE content_plans SET claimed_at = $3 \
             WHERE id = $1 AND status = $2 \
               AND (claimed_at IS NULL OR claimed_at < $4)",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(at)
        .bind(stale_before)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn release(pool: &PgPool, id: PlanId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE content_plans SET claimed_at = NULL WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Move a plan from `from` to `to`, stamping the matching timestamp and
    /// releasing its claim.
    ///
    /// Returns `false` when the plan was not in `from`.
    pub async fn transition(
        pool: &PgPool,
        id: PlanId,
        from: PlanStatus,
        to: PlanStatus,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let stamp = match to {
            PlanStatus::Executed => "executed_at",
            PlanStatus::Reverted => "reverted_at",
            PlanStatus::Proposed => "created_at",
        };
        let query = format!(
            "UPDATE content_plans SET status = $3, {stamp} = $4, claimed_at = NULL \
             WHERE id = $1 AND status = $2"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(at)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
