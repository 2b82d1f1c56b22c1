//! Maps to the `content_changes` table.

use folio_core::action::ActionKind;
use folio_core::change::Change;
use folio_core::store::StoreError;
use folio_core::types::{ChangeId, PlanId, Record, RecordId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `content_changes` table.
#[derive(Debug, Clone, FromRow)]
pub struct ChangeRow {
    pub id: ChangeId,
    pub plan_id: PlanId,
    pub action_index: i32,
    pub table_name: String,
    pub record_id: RecordId,
    pub action_type: String,
    pub description: String,
    pub previous_data: Option<Json<Record>>,
    pub new_data: Option<Json<Record>>,
    pub reverted: bool,
    pub reverted_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl ChangeRow {
    pub fn into_change(self) -> Result<Change, StoreError> {
        let action_type = ActionKind::from_str_value(&self.action_type)
            .map_err(|e| StoreError::Corrupt(format!("content_changes.{}: {e}", self.id)))?;
        Ok(Change {
            id: self.id,
            plan_id: self.plan_id,
            action_index: self.action_index,
            table_name: self.table_name,
            record_id: self.record_id,
            action_type,
            description: self.description,
            previous_data: self.previous_data.map(|j| j.0),
            new_data: self.new_data.map(|j| j.0),
            reverted: self.reverted,
            reverted_at: self.reverted_at,
            created_at: self.created_at,
        })
    }
}
