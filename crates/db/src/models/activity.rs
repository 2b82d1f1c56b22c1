//! Maps to the `admin_activity` table.

use folio_core::types::{ChangeId, PlanId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `admin_activity` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActivityRow {
    pub id: i64,
    pub event_type: String,
    pub plan_id: PlanId,
    pub change_id: Option<ChangeId>,
    pub actor: String,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}
