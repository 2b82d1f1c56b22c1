//! Append-only admin activity events emitted by the engines.

use serde::{Deserialize, Serialize};

use crate::types::{ChangeId, PlanId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    #[serde(rename = "plan.created")]
    PlanCreated,
    #[serde(rename = "plan.executed")]
    PlanExecuted,
    #[serde(rename = "plan.execution_aborted")]
    PlanExecutionAborted,
    #[serde(rename = "plan.reverted")]
    PlanReverted,
    #[serde(rename = "plan.revert_partial")]
    PlanRevertPartial,
    #[serde(rename = "change.reverted")]
    ChangeReverted,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlanCreated => "plan.created",
            Self::PlanExecuted => "plan.executed",
            Self::PlanExecutionAborted => "plan.execution_aborted",
            Self::PlanReverted => "plan.reverted",
            Self::PlanRevertPartial => "plan.revert_partial",
            Self::ChangeReverted => "change.reverted",
        }
    }
}

/// One lifecycle transition worth surfacing in the admin activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub plan_id: PlanId,
    pub change_id: Option<ChangeId>,
    pub actor: String,
    pub payload: serde_json::Value,
    pub at: Timestamp,
}

impl ActivityEvent {
    pub fn new(kind: ActivityKind, plan_id: PlanId, actor: impl Into<String>) -> Self {
        Self {
            kind,
            plan_id,
            change_id: None,
            actor: actor.into(),
            payload: serde_json::Value::Object(Default::default()),
            at: chrono::Utc::now(),
        }
    }

    pub fn with_change(mut self, change_id: ChangeId) -> Self {
        self.change_id = Some(change_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Destination for activity events. Recording must not fail the caller.
pub trait ActivitySink: Send + Sync {
    fn record(&self, event: ActivityEvent);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopActivitySink;

impl ActivitySink for NoopActivitySink {
    fn record(&self, _event: ActivityEvent) {}
}
