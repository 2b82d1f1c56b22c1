//! Persisted before/after snapshots of executed actions.

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::types::{ChangeId, PlanId, Record, RecordId, Timestamp};

/// One executed action's effect on a single record. Immutable apart from
/// the `reverted` flag and its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub id: ChangeId,
    pub plan_id: PlanId,
    /// Position of the originating action within its plan.
    pub action_index: i32,
    pub table_name: String,
    pub record_id: RecordId,
    pub action_type: ActionKind,
    pub description: String,
    /// `None` for creates.
    pub previous_data: Option<Record>,
    /// `None` for deletes.
    pub new_data: Option<Record>,
    pub reverted: bool,
    pub reverted_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Change {
    /// Whether the snapshot pair matches what `action_type` must capture.
    pub fn has_consistent_snapshots(&self) -> bool {
        match self.action_type {
            ActionKind::Create => self.previous_data.is_none() && self.new_data.is_some(),
            ActionKind::Update => self.previous_data.is_some() && self.new_data.is_some(),
            ActionKind::Delete => self.previous_data.is_some() && self.new_data.is_none(),
        }
    }

    /// Names of fields whose value differs between the two snapshots.
    pub fn changed_fields(&self) -> Vec<String> {
        let empty = Record::new();
        let before = self.previous_data.as_ref().unwrap_or(&empty);
        let after = self.new_data.as_ref().unwrap_or(&empty);
        let mut fields: Vec<String> = before
            .keys()
            .chain(after.keys())
            .filter(|k| before.get(*k) != after.get(*k))
            .cloned()
            .collect();
        fields.sort();
        fields.dedup();
        fields
    }
}
