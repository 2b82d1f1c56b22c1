//! Persists one change entry per executed action.

use crate::action::Action;
use crate::change::Change;
use crate::error::CoreError;
use crate::executor::ActionOutcome;
use crate::store::PlanStore;
use crate::types::PlanId;

pub struct DiffRecorder<'a> {
    plans: &'a dyn PlanStore,
}

impl<'a> DiffRecorder<'a> {
    pub fn new(plans: &'a dyn PlanStore) -> Self {
        Self { plans }
    }

    /// Write the before/after snapshot of `outcome` as a change of `plan_id`.
    ///
    /// Errors are returned, never swallowed: a mutation without its change
    /// entry cannot be reverted.
    pub async fn record(
        &self,
        plan_id: PlanId,
        action_index: usize,
        action: &Action,
        outcome: &ActionOutcome,
    ) -> Result<Change, CoreError> {
        let change = Change {
            id: uuid::Uuid::new_v4(),
            plan_id,
            action_index: i32::try_from(action_index)
                .map_err(|_| CoreError::Internal(format!("Action index {action_index} overflows")))?,
            table_name: outcome.table.as_str().to_string(),
            record_id: outcome.record_id,
            action_type: action.kind,
            description: action.description.clone(),
            previous_data: outcome.previous_data.clone(),
            new_data: outcome.new_data.clone(),
            reverted: false,
            reverted_at: None,
            created_at: chrono::Utc::now(),
        };

        if !change.has_consistent_snapshots() {
            return Err(CoreError::Internal(format!(
                "Snapshots of {} change on {} do not match the action type",
                change.action_type, change.table_name
            )));
        }

        self.plans.insert_change(&change).await?;

        tracing::debug!(
            %plan_id,
            change_id = %change.id,
            table = %change.table_name,
            record_id = %change.record_id,
            action_type = %change.action_type,
            "Change recorded"
        );

        Ok(change)
    }
}
