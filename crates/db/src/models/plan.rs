//! Maps to the `content_plans` table.

use folio_core::action::Action;
use folio_core::plan::{ContentPlan, PlanStatus};
use folio_core::store::StoreError;
use folio_core::types::{PlanId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `content_plans` table.
#[derive(Debug, Clone, FromRow)]
pub struct PlanRow {
    pub id: PlanId,
    pub title: String,
    pub summary: String,
    pub actions: Json<Vec<Action>>,
    pub status: String,
    pub created_at: Timestamp,
    pub executed_at: Option<Timestamp>,
    pub reverted_at: Option<Timestamp>,
}

impl PlanRow {
    pub fn into_plan(self) -> Result<ContentPlan, StoreError> {
        let status = PlanStatus::from_str_value(&self.status)
            .map_err(|e| StoreError::Corrupt(format!("content_plans.{}: {e}", self.id)))?;
        Ok(ContentPlan {
            id: self.id,
            title: self.title,
            summary: self.summary,
            actions: self.actions.0,
            status,
            created_at: self.created_at,
            executed_at: self.executed_at,
            reverted_at: self.reverted_at,
        })
    }
}
