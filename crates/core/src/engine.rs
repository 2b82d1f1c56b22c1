//! Plan lifecycle: acceptance, sequential execution and history reads.
//!
//! Actions run strictly in plan order. A failing action is collected and
//! execution moves on to the next one; the applied subset stands and the
//! plan still becomes `executed`. The one fatal case is a change entry that
//! cannot be written after its mutation succeeded: execution stops at once
//! and the plan is left `proposed` so it shows up as orphaned.
//!
//! A run holds the plan's claim from the first mutation until the status
//! moves, so concurrent executions of one plan cannot both apply it. An
//! orphaned plan is never re-run.

use serde::Serialize;

use crate::access::{require_admin, Caller};
use crate::action::{Action, ActionKind};
use crate::activity::{ActivityEvent, ActivityKind, ActivitySink};
use crate::change::Change;
use crate::diff::DiffRecorder;
use crate::error::{CoreError, ErrorDetail};
use crate::executor::ActionExecutor;
use crate::plan::{ContentPlan, PlanDraft, PlanStatus, PlanWithChanges};
use crate::store::{claim_stale_before, ContentStore, PlanStore};
use crate::types::{PlanId, RecordId, Timestamp};

/// Default page size of the plan history.
pub const DEFAULT_HISTORY_LIMIT: i64 = 20;

/// Largest page size of the plan history.
pub const MAX_HISTORY_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Every action applied.
    Applied,
    /// At least one action failed; the others stand.
    PartiallyApplied,
}

/// One action that could not be applied.
#[derive(Debug, Clone, Serialize)]
pub struct FailedAction {
    pub index: usize,
    pub action: Action,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub plan_id: PlanId,
    pub outcome: ExecutionOutcome,
    pub succeeded_count: usize,
    pub total_count: usize,
    pub failed_actions: Vec<FailedAction>,
    pub changes: Vec<Change>,
    pub executed_at: Timestamp,
}

impl ExecutionReport {
    /// Human-readable "N of M actions applied" line.
    pub fn summary(&self) -> String {
        format!(
            "{} of {} actions applied",
            self.succeeded_count, self.total_count
        )
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct PlanEngine<'a> {
    content: &'a dyn ContentStore,
    plans: &'a dyn PlanStore,
    activity: &'a dyn ActivitySink,
}

impl<'a> PlanEngine<'a> {
    pub fn new(
        content: &'a dyn ContentStore,
        plans: &'a dyn PlanStore,
        activity: &'a dyn ActivitySink,
    ) -> Self {
        Self {
            content,
            plans,
            activity,
        }
    }

    /// Accept a draft as a new `proposed` plan.
    pub async fn create_plan(
        &self,
        caller: &Caller,
        draft: PlanDraft,
    ) -> Result<ContentPlan, CoreError> {
        require_admin(caller)?;
        draft.check()?;

        let plan = ContentPlan {
            id: uuid::Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            summary: draft.summary,
            actions: draft.actions,
            status: PlanStatus::Proposed,
            created_at: chrono::Utc::now(),
            executed_at: None,
            reverted_at: None,
        };
        self.plans.insert_plan(&plan).await?;

        tracing::info!(
            plan_id = %plan.id,
            actor = %caller.actor,
            action_count = plan.actions.len(),
            "Content plan created"
        );
        self.activity.record(
            ActivityEvent::new(ActivityKind::PlanCreated, plan.id, &caller.actor)
                .with_payload(serde_json::json!({ "title": plan.title })),
        );

        Ok(plan)
    }

    /// Run every action of a `proposed` plan in order and mark it `executed`.
    pub async fn execute_plan(
        &self,
        caller: &Caller,
        plan_id: PlanId,
    ) -> Result<ExecutionReport, CoreError> {
        require_admin(caller)?;

        let plan = self
            .plans
            .find_plan(plan_id)
            .await?
            .ok_or_else(|| CoreError::not_found("content_plan", plan_id))?;
        plan.ensure_transition(PlanStatus::Executed)?;
        if plan.actions.is_empty() {
            return Err(CoreError::Validation(
                "A plan without actions cannot be executed".to_string(),
            ));
        }

        let claimed_at = chrono::Utc::now();
        let stale_before = claim_stale_before(claimed_at);
        if !self
            .plans
            .claim_plan(plan_id, PlanStatus::Proposed, claimed_at, stale_before)
            .await?
        {
            return Err(CoreError::Conflict(format!(
                "Plan {plan_id} is already being executed"
            )));
        }
        if !self.plans.list_changes(plan_id).await?.is_empty() {
            self.plans.release_plan(plan_id).await?;
            return Err(CoreError::Conflict(format!(
                "Plan {plan_id} has changes from an interrupted run and must be reconciled first"
            )));
        }

        let executor = ActionExecutor::new(self.content);
        let recorder = DiffRecorder::new(self.plans);

        let total_count = plan.actions.len();
        let mut created: Vec<Option<RecordId>> = vec![None; total_count];
        let mut changes: Vec<Change> = Vec::with_capacity(total_count);
        let mut failed_actions = Vec::new();

        for (index, action) in plan.actions.iter().enumerate() {
            let applied = match action.resolve(index, &created) {
                Ok(resolved) => executor
                    .execute(&resolved)
                    .await
                    .map(|outcome| (resolved, outcome)),
                Err(e) => Err(e),
            };

            let (resolved, outcome) = match applied {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(
                        %plan_id,
                        index,
                        table = %action.table,
                        error = %e,
                        "Plan action failed"
                    );
                    failed_actions.push(FailedAction {
                        index,
                        action: action.clone(),
                        error: ErrorDetail::from(&e),
                    });
                    continue;
                }
            };

            if resolved.kind == ActionKind::Create {
                created[index] = Some(outcome.record_id);
            }

            match recorder.record(plan_id, index, &resolved, &outcome).await {
                Ok(change) => changes.push(change),
                Err(e) => {
                    tracing::error!(
                        %plan_id,
                        index,
                        table = %outcome.table,
                        record_id = %outcome.record_id,
                        error = %e,
                        "Change could not be recorded, aborting plan execution"
                    );
                    self.activity.record(
                        ActivityEvent::new(
                            ActivityKind::PlanExecutionAborted,
                            plan_id,
                            &caller.actor,
                        )
                        .with_payload(serde_json::json!({
                            "action_index": index,
                            "table": outcome.table,
                            "record_id": outcome.record_id,
                            "error": e.to_string(),
                        })),
                    );
                    return Err(CoreError::HistoryWrite {
                        plan_id,
                        applied: changes.len(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let executed_at = chrono::Utc::now();
        if !self.plans.mark_executed(plan_id, executed_at).await? {
            return Err(CoreError::Conflict(format!(
                "Plan {plan_id} left the proposed state while it was being executed"
            )));
        }

        let outcome = if failed_actions.is_empty() {
            ExecutionOutcome::Applied
        } else {
            ExecutionOutcome::PartiallyApplied
        };
        let report = ExecutionReport {
            plan_id,
            outcome,
            succeeded_count: changes.len(),
            total_count,
            failed_actions,
            changes,
            executed_at,
        };

        tracing::info!(
            %plan_id,
            actor = %caller.actor,
            succeeded = report.succeeded_count,
            failed = report.failed_actions.len(),
            "Content plan executed"
        );
        self.activity.record(
            ActivityEvent::new(ActivityKind::PlanExecuted, plan_id, &caller.actor).with_payload(
                serde_json::json!({
                    "succeeded_count": report.succeeded_count,
                    "total_count": report.total_count,
                    "failed_indices": report
                        .failed_actions
                        .iter()
                        .map(|f| f.index)
                        .collect::<Vec<_>>(),
                }),
            ),
        );

        Ok(report)
    }

    /// Plans with their changes, most recent first.
    pub async fn plan_history(
        &self,
        caller: &Caller,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PlanWithChanges>, CoreError> {
        require_admin(caller)?;
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        let offset = offset.max(0);

        let plans = self.plans.list_plans(limit, offset).await?;
        let mut history = Vec::with_capacity(plans.len());
        for plan in plans {
            let changes = self.plans.list_changes(plan.id).await?;
            history.push(PlanWithChanges { plan, changes });
        }
        Ok(history)
    }

    pub async fn plan_detail(
        &self,
        caller: &Caller,
        plan_id: PlanId,
    ) -> Result<PlanWithChanges, CoreError> {
        require_admin(caller)?;
        let plan = self
            .plans
            .find_plan(plan_id)
            .await?
            .ok_or_else(|| CoreError::not_found("content_plan", plan_id))?;
        let changes = self.plans.list_changes(plan_id).await?;
        Ok(PlanWithChanges { plan, changes })
    }

    /// Plans whose execution was interrupted: still `proposed` but already
    /// owning changes. These need manual reconciliation.
    pub async fn orphaned_plans(&self, caller: &Caller) -> Result<Vec<PlanWithChanges>, CoreError> {
        require_admin(caller)?;
        let plans = self.plans.list_orphaned_plans().await?;
        let mut orphaned = Vec::with_capacity(plans.len());
        for plan in plans {
            let changes = self.plans.list_changes(plan.id).await?;
            orphaned.push(PlanWithChanges { plan, changes });
        }
        Ok(orphaned)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::memory::{MemoryContentStore, MemoryPlanStore, RecordingActivitySink};
    use crate::tables::ContentTable;

    struct Fixture {
        content: MemoryContentStore,
        plans: MemoryPlanStore,
        activity: RecordingActivitySink,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                content: MemoryContentStore::new(),
                plans: MemoryPlanStore::new(),
                activity: RecordingActivitySink::new(),
            }
        }

        fn engine(&self) -> PlanEngine<'_> {
            PlanEngine::new(&self.content, &self.plans, &self.activity)
        }
    }

    fn admin() -> Caller {
        Caller::admin("owner")
    }

    fn draft(actions: serde_json::Value) -> PlanDraft {
        serde_json::from_value(json!({
            "title": "Test plan",
            "summary": "test",
            "actions": actions,
        }))
        .expect("valid draft")
    }

    #[tokio::test]
    async fn create_plan_starts_proposed() {
        let fx = Fixture::new();
        let plan = fx
            .engine()
            .create_plan(
                &admin(),
                draft(json!([{"type": "create", "table": "skills",
                              "data": {"name": "Rust", "category": "lang"}, "description": "add"}])),
            )
            .await
            .unwrap();

        assert_eq!(plan.status, PlanStatus::Proposed);
        assert!(plan.executed_at.is_none());
        assert_eq!(fx.activity.events()[0].kind, ActivityKind::PlanCreated);
    }

    #[tokio::test]
    async fn non_admin_is_rejected_before_any_io() {
        let fx = Fixture::new();
        let visitor = Caller::visitor("guest");

        let created = fx
            .engine()
            .create_plan(
                &visitor,
                draft(json!([{"type": "delete", "table": "skills",
                              "record_id": Uuid::new_v4().to_string(), "description": "d"}])),
            )
            .await;
        assert_matches!(created, Err(CoreError::Unauthorized(_)));

        let executed = fx.engine().execute_plan(&visitor, Uuid::new_v4()).await;
        assert_matches!(executed, Err(CoreError::Unauthorized(_)));
        assert_eq!(fx.content.io_calls(), 0);
        assert!(fx.activity.events().is_empty());
    }

    #[tokio::test]
    async fn executes_all_actions_in_order() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let plan = engine
            .create_plan(
                &admin(),
                draft(json!([
                    {"type": "create", "table": "projects",
                     "data": {"title": "Kiln", "description": "Pottery tracker"},
                     "description": "add project"},
                    {"type": "create", "table": "updates",
                     "data": {"title": "Kiln launched", "content": "Live now", "project_id": "$action:0"},
                     "description": "announce"}
                ])),
            )
            .await
            .unwrap();

        let report = engine.execute_plan(&admin(), plan.id).await.unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::Applied);
        assert_eq!(report.summary(), "2 of 2 actions applied");
        let project_id = report.changes[0].record_id;
        let update = fx.content.get(ContentTable::Updates, report.changes[1].record_id).unwrap();
        assert_eq!(update["project_id"], json!(project_id.to_string()));

        let stored = fx.plans.find_plan(plan.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PlanStatus::Executed);
        assert!(stored.executed_at.is_some());
    }

    #[tokio::test]
    async fn failing_action_does_not_block_the_rest() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let skill = fx
            .content
            .seed(ContentTable::Skills, json!({"name": "Go", "category": "lang"}));

        let plan = engine
            .create_plan(
                &admin(),
                draft(json!([
                    {"type": "create", "table": "skills",
                     "data": {"name": "Rust", "category": "lang"}, "description": "first"},
                    {"type": "update", "table": "skills",
                     "record_id": Uuid::new_v4().to_string(),
                     "data": {"name": "Zig"}, "description": "missing record"},
                    {"type": "update", "table": "skills", "record_id": skill.to_string(),
                     "data": {"category": "systems"}, "description": "third"}
                ])),
            )
            .await
            .unwrap();

        let report = engine.execute_plan(&admin(), plan.id).await.unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::PartiallyApplied);
        assert_eq!(report.succeeded_count, 2);
        assert_eq!(report.failed_actions.len(), 1);
        assert_eq!(report.failed_actions[0].index, 1);
        assert_eq!(report.failed_actions[0].error.code, "NOT_FOUND");
        assert_eq!(fx.plans.list_changes(plan.id).await.unwrap().len(), 2);
        assert_eq!(
            fx.content.get(ContentTable::Skills, skill).unwrap()["category"],
            json!("systems")
        );

        let stored = fx.plans.find_plan(plan.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PlanStatus::Executed);
    }

    #[tokio::test]
    async fn forbidden_table_is_a_per_action_failure() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let plan = engine
            .create_plan(
                &admin(),
                draft(json!([
                    {"type": "delete", "table": "auth_users",
                     "record_id": Uuid::new_v4().to_string(), "description": "nope"},
                    {"type": "create", "table": "skills",
                     "data": {"name": "Rust", "category": "lang"}, "description": "ok"}
                ])),
            )
            .await
            .unwrap();

        let report = engine.execute_plan(&admin(), plan.id).await.unwrap();
        assert_eq!(report.failed_actions[0].error.code, "FORBIDDEN_TABLE");
        assert_eq!(report.succeeded_count, 1);
    }

    #[tokio::test]
    async fn dependent_action_fails_when_its_create_failed() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let plan = engine
            .create_plan(
                &admin(),
                draft(json!([
                    {"type": "create", "table": "projects",
                     "data": {"title": "No description"}, "description": "invalid"},
                    {"type": "update", "table": "projects", "record_id": "$action:0",
                     "data": {"status": "live"}, "description": "depends on 0"}
                ])),
            )
            .await
            .unwrap();

        let report = engine.execute_plan(&admin(), plan.id).await.unwrap();
        assert_eq!(report.succeeded_count, 0);
        let codes: Vec<&str> = report
            .failed_actions
            .iter()
            .map(|f| f.error.code.as_str())
            .collect();
        assert_eq!(codes, vec!["VALIDATION_ERROR", "VALIDATION_ERROR"]);
    }

    #[tokio::test]
    async fn executing_twice_is_a_conflict() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let plan = engine
            .create_plan(
                &admin(),
                draft(json!([{"type": "create", "table": "skills",
                              "data": {"name": "Rust", "category": "lang"}, "description": "add"}])),
            )
            .await
            .unwrap();

        engine.execute_plan(&admin(), plan.id).await.unwrap();
        let second = engine.execute_plan(&admin(), plan.id).await;
        assert_matches!(second, Err(CoreError::Conflict(_)));
        assert_eq!(fx.content.count(ContentTable::Skills), 1);
    }

    #[tokio::test]
    async fn plan_without_actions_cannot_execute() {
        let fx = Fixture::new();
        let plan = ContentPlan {
            id: Uuid::new_v4(),
            title: "Empty".into(),
            summary: String::new(),
            actions: Vec::new(),
            status: PlanStatus::Proposed,
            created_at: chrono::Utc::now(),
            executed_at: None,
            reverted_at: None,
        };
        fx.plans.insert_plan(&plan).await.unwrap();

        let result = fx.engine().execute_plan(&admin(), plan.id).await;
        assert_matches!(result, Err(CoreError::Validation(_)));
        let stored = fx.plans.find_plan(plan.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PlanStatus::Proposed);
    }

    #[tokio::test]
    async fn history_write_failure_aborts_and_leaves_plan_orphaned() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let plan = engine
            .create_plan(
                &admin(),
                draft(json!([
                    {"type": "create", "table": "skills",
                     "data": {"name": "Rust", "category": "lang"}, "description": "first"},
                    {"type": "create", "table": "skills",
                     "data": {"name": "Zig", "category": "lang"}, "description": "second"}
                ])),
            )
            .await
            .unwrap();

        fx.plans.fail_change_inserts(true);
        let result = engine.execute_plan(&admin(), plan.id).await;

        assert_matches!(result, Err(CoreError::HistoryWrite { applied: 0, .. }));
        // The first insert happened; the second action never ran.
        assert_eq!(fx.content.count(ContentTable::Skills), 1);
        let stored = fx.plans.find_plan(plan.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PlanStatus::Proposed);
        assert!(fx
            .activity
            .events()
            .iter()
            .any(|e| e.kind == ActivityKind::PlanExecutionAborted));
    }

    #[tokio::test]
    async fn orphaned_plans_have_changes_but_no_execution() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let plan = engine
            .create_plan(
                &admin(),
                draft(json!([
                    {"type": "create", "table": "skills",
                     "data": {"name": "Rust", "category": "lang"}, "description": "first"}
                ])),
            )
            .await
            .unwrap();

        // Simulate an interrupted run: a change exists, the status never moved.
        fx.plans
            .insert_change(&Change {
                id: Uuid::new_v4(),
                plan_id: plan.id,
                action_index: 0,
                table_name: "skills".into(),
                record_id: Uuid::new_v4(),
                action_type: ActionKind::Create,
                description: "first".into(),
                previous_data: None,
                new_data: json!({"name": "Rust"}).as_object().cloned(),
                reverted: false,
                reverted_at: None,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let orphaned = engine.orphaned_plans(&admin()).await.unwrap();
        assert_eq!(orphaned.len(), 1);
        assert_eq!(orphaned[0].plan.id, plan.id);
        assert_eq!(orphaned[0].changes.len(), 1);
    }

    #[tokio::test]
    async fn orphaned_plan_cannot_be_executed_again() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let plan = engine
            .create_plan(
                &admin(),
                draft(json!([
                    {"type": "create", "table": "skills",
                     "data": {"name": "Rust", "category": "lang"}, "description": "first"},
                    {"type": "create", "table": "skills",
                     "data": {"name": "Zig", "category": "lang"}, "description": "second"}
                ])),
            )
            .await
            .unwrap();

        fx.plans.fail_change_inserts(true);
        let aborted = engine.execute_plan(&admin(), plan.id).await;
        assert_matches!(aborted, Err(CoreError::HistoryWrite { .. }));
        assert_eq!(fx.content.count(ContentTable::Skills), 1);

        fx.plans.fail_change_inserts(false);
        let retried = engine.execute_plan(&admin(), plan.id).await;
        assert_matches!(retried, Err(CoreError::Conflict(_)));
        assert_eq!(fx.content.count(ContentTable::Skills), 1);
    }

    #[tokio::test]
    async fn plan_claimed_by_another_run_is_a_conflict() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let plan = engine
            .create_plan(
                &admin(),
                draft(json!([{"type": "create", "table": "skills",
                              "data": {"name": "Rust", "category": "lang"}, "description": "add"}])),
            )
            .await
            .unwrap();

        let now = chrono::Utc::now();
        assert!(fx
            .plans
            .claim_plan(plan.id, PlanStatus::Proposed, now, claim_stale_before(now))
            .await
            .unwrap());

        let io_before = fx.content.io_calls();
        let result = engine.execute_plan(&admin(), plan.id).await;
        assert_matches!(result, Err(CoreError::Conflict(_)));
        assert_eq!(fx.content.io_calls(), io_before);
        let stored = fx.plans.find_plan(plan.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PlanStatus::Proposed);
    }

    #[tokio::test]
    async fn concurrent_executions_apply_the_plan_once() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let plan = engine
            .create_plan(
                &admin(),
                draft(json!([{"type": "create", "table": "skills",
                              "data": {"name": "Rust", "category": "lang"}, "description": "add"}])),
            )
            .await
            .unwrap();

        let (caller_a, caller_b) = (admin(), admin());
        let (first, second) = tokio::join!(
            engine.execute_plan(&caller_a, plan.id),
            engine.execute_plan(&caller_b, plan.id)
        );

        let succeeded = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);
        assert!([first, second]
            .into_iter()
            .any(|r| matches!(r, Err(CoreError::Conflict(_)))));
        assert_eq!(fx.content.count(ContentTable::Skills), 1);
    }

    #[tokio::test]
    async fn stale_claim_does_not_block_execution() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let plan = engine
            .create_plan(
                &admin(),
                draft(json!([{"type": "create", "table": "skills",
                              "data": {"name": "Rust", "category": "lang"}, "description": "add"}])),
            )
            .await
            .unwrap();

        let abandoned = chrono::Utc::now() - chrono::Duration::hours(2);
        assert!(fx
            .plans
            .claim_plan(plan.id, PlanStatus::Proposed, abandoned, claim_stale_before(abandoned))
            .await
            .unwrap());

        let report = engine.execute_plan(&admin(), plan.id).await.unwrap();
        assert_eq!(report.outcome, ExecutionOutcome::Applied);
    }

    #[tokio::test]
    async fn history_lists_most_recent_first() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let mut ids = Vec::new();
        for name in ["A", "B", "C"] {
            let plan = engine
                .create_plan(
                    &admin(),
                    draft(json!([{"type": "create", "table": "skills",
                                  "data": {"name": name, "category": "lang"}, "description": "add"}])),
                )
                .await
                .unwrap();
            ids.push(plan.id);
        }

        let history = engine.plan_history(&admin(), 2, 0).await.unwrap();
        let listed: Vec<PlanId> = history.iter().map(|p| p.plan.id).collect();
        assert_eq!(listed, vec![ids[2], ids[1]]);
    }

    #[tokio::test]
    async fn execution_works_without_activity_listeners() {
        let content = MemoryContentStore::new();
        let plans = MemoryPlanStore::new();
        let engine = PlanEngine::new(&content, &plans, &crate::activity::NoopActivitySink);

        let plan = engine
            .create_plan(
                &admin(),
                draft(json!([{"type": "create", "table": "skills",
                              "data": {"name": "Rust", "category": "lang"}, "description": "add"}])),
            )
            .await
            .unwrap();
        let report = engine.execute_plan(&admin(), plan.id).await.unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::Applied);
        assert_eq!(content.count(ContentTable::Skills), 1);
    }
}
