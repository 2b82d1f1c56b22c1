//! Undo of executed changes.
//!
//! Each change is undone by applying its inverse against the content store:
//! a create is deleted, an update has its previous field values written
//! back, a delete is re-inserted from its snapshot. Undo never appends to
//! the change history; it only flips the `reverted` flag.
//!
//! A re-inserted record gets a fresh id, so the remaining active changes on
//! the deleted record are moved onto it. Plans and changes are claimed
//! before any content is touched.

use serde::Serialize;

use crate::access::{require_admin, Caller};
use crate::action::{Action, ActionKind, RecordRef};
use crate::activity::{ActivityEvent, ActivityKind, ActivitySink};
use crate::change::Change;
use crate::error::{CoreError, ErrorDetail};
use crate::executor::{self, ActionExecutor};
use crate::plan::PlanStatus;
use crate::store::{claim_stale_before, ContentStore, PlanStore};
use crate::tables::{self, ContentTable};
use crate::types::{ChangeId, PlanId, RecordId};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRevertStatus {
    Reverted,
    /// The change had already been reverted; nothing was touched.
    AlreadyReverted,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeRevert {
    pub change_id: ChangeId,
    pub status: ChangeRevertStatus,
    /// Id of the re-inserted record when a delete was undone. The store
    /// assigns a fresh id, so it differs from the original; active changes
    /// on the original now point here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restored_record_id: Option<RecordId>,
}

impl ChangeRevert {
    fn already_reverted(change_id: ChangeId) -> Self {
        Self {
            change_id,
            status: ChangeRevertStatus::AlreadyReverted,
            restored_record_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanRevertOutcome {
    Reverted,
    PartiallyReverted,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedChange {
    pub change_id: ChangeId,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanRevertReport {
    pub plan_id: PlanId,
    pub outcome: PlanRevertOutcome,
    pub reverted_count: usize,
    pub skipped: Vec<SkippedChange>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct RevertEngine<'a> {
    content: &'a dyn ContentStore,
    plans: &'a dyn PlanStore,
    activity: &'a dyn ActivitySink,
}

impl<'a> RevertEngine<'a> {
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

    /// Undo a single change. Reverting an already reverted change is a no-op.
    ///
    /// When this was the owning plan's last active change, the plan moves to
    /// `reverted` as well.
    pub async fn revert_change(
        &self,
        caller: &Caller,
        change_id: ChangeId,
    ) -> Result<ChangeRevert, CoreError> {
        require_admin(caller)?;

        let change = self
            .plans
            .find_change(change_id)
            .await?
            .ok_or_else(|| CoreError::not_found("content_change", change_id))?;

        let result = self.undo(&change, caller).await?;

        if result.status == ChangeRevertStatus::Reverted {
            self.settle_plan(change.plan_id, caller).await?;
        }
        Ok(result)
    }

    /// Undo every active change of an executed plan, most recent first.
    ///
    /// Changes whose inverse cannot be applied are skipped and reported; the
    /// plan only becomes `reverted` when none were skipped.
    pub async fn revert_plan(
        &self,
        caller: &Caller,
        plan_id: PlanId,
    ) -> Result<PlanRevertReport, CoreError> {
        require_admin(caller)?;

        let plan = self
            .plans
            .find_plan(plan_id)
            .await?
            .ok_or_else(|| CoreError::not_found("content_plan", plan_id))?;
        plan.ensure_transition(PlanStatus::Reverted)?;

        let claimed_at = chrono::Utc::now();
        if !self
            .plans
            .claim_plan(
                plan_id,
                PlanStatus::Executed,
                claimed_at,
                claim_stale_before(claimed_at),
            )
            .await?
        {
            return Err(CoreError::Conflict(format!(
                "Plan {plan_id} is already being reverted"
            )));
        }

        let (reverted_count, skipped) = match self.unwind(plan_id, caller).await {
            Ok(tally) => tally,
            Err(e) => {
                self.release_plan_claim(plan_id).await;
                return Err(e);
            }
        };

        let outcome = if skipped.is_empty() {
            if !self.plans.mark_reverted(plan_id, chrono::Utc::now()).await? {
                self.release_plan_claim(plan_id).await;
                return Err(CoreError::Conflict(format!(
                    "Plan {plan_id} left the executed state while it was being reverted"
                )));
            }
            tracing::info!(%plan_id, actor = %caller.actor, reverted_count, "Content plan reverted");
            self.activity.record(
                ActivityEvent::new(ActivityKind::PlanReverted, plan_id, &caller.actor)
                    .with_payload(serde_json::json!({ "reverted_count": reverted_count })),
            );
            PlanRevertOutcome::Reverted
        } else {
            self.release_plan_claim(plan_id).await;
            tracing::warn!(
                %plan_id,
                actor = %caller.actor,
                reverted_count,
                skipped = skipped.len(),
                "Content plan partially reverted"
            );
            self.activity.record(
                ActivityEvent::new(ActivityKind::PlanRevertPartial, plan_id, &caller.actor)
                    .with_payload(serde_json::json!({
                        "reverted_count": reverted_count,
                        "skipped": skipped.iter().map(|s| s.change_id).collect::<Vec<_>>(),
                    })),
            );
            PlanRevertOutcome::PartiallyReverted
        };

        Ok(PlanRevertReport {
            plan_id,
            outcome,
            reverted_count,
            skipped,
        })
    }

    /// Undo the plan's active changes like a stack, collecting the ones
    /// whose inverse cannot be applied.
    async fn unwind(
        &self,
        plan_id: PlanId,
        caller: &Caller,
    ) -> Result<(usize, Vec<SkippedChange>), CoreError> {
        let mut active: Vec<Change> = self
            .plans
            .list_changes(plan_id)
            .await?
            .into_iter()
            .filter(|c| !c.reverted)
            .collect();
        // Repeated edits to one record restore the oldest snapshot last.
        active.sort_by(|a, b| {
            b.action_index
                .cmp(&a.action_index)
                .then(b.created_at.cmp(&a.created_at))
        });

        let mut reverted_count = 0;
        let mut skipped = Vec::new();
        for change in &active {
            match self.undo(change, caller).await {
                Ok(result) if result.status == ChangeRevertStatus::Reverted => reverted_count += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        %plan_id,
                        change_id = %change.id,
                        error = %e,
                        "Change skipped during plan revert"
                    );
                    skipped.push(SkippedChange {
                        change_id: change.id,
                        error: ErrorDetail::from(&e),
                    });
                }
            }
        }
        Ok((reverted_count, skipped))
    }

    async fn release_plan_claim(&self, plan_id: PlanId) {
        if let Err(e) = self.plans.release_plan(plan_id).await {
            tracing::warn!(%plan_id, error = %e, "Plan claim could not be released");
        }
    }

    async fn undo(&self, change: &Change, caller: &Caller) -> Result<ChangeRevert, CoreError> {
        if change.reverted {
            return Ok(ChangeRevert::already_reverted(change.id));
        }
        let table: ContentTable = change.table_name.parse()?;

        let claimed_at = chrono::Utc::now();
        if !self
            .plans
            .claim_change(change.id, claimed_at, claim_stale_before(claimed_at))
            .await?
        {
            return match self.plans.find_change(change.id).await? {
                Some(current) if current.reverted => Ok(ChangeRevert::already_reverted(change.id)),
                _ => Err(CoreError::Conflict(format!(
                    "Change {} is already being reverted",
                    change.id
                ))),
            };
        }

        // Re-read under the claim: an earlier delete undo may have moved the
        // change to a re-created record.
        let current = match self.plans.find_change(change.id).await? {
            Some(current) => current,
            None => {
                self.release_change_claim(change.id).await;
                return Err(CoreError::not_found("content_change", change.id));
            }
        };
        let change = &current;

        let restored_record_id = match self.apply_inverse(table, change).await {
            Ok(id) => id,
            Err(e) => {
                self.release_change_claim(change.id).await;
                return Err(e);
            }
        };

        if !self
            .plans
            .mark_change_reverted(change.id, chrono::Utc::now())
            .await?
        {
            return Err(CoreError::Conflict(format!(
                "Change {} was reverted concurrently",
                change.id
            )));
        }

        if let Some(restored) = restored_record_id {
            match self
                .plans
                .retarget_changes(table, change.record_id, restored)
                .await
            {
                Ok(moved) => tracing::debug!(
                    change_id = %change.id,
                    %table,
                    from = %change.record_id,
                    to = %restored,
                    moved,
                    "Active changes moved to re-created record"
                ),
                Err(e) => tracing::error!(
                    change_id = %change.id,
                    %table,
                    from = %change.record_id,
                    to = %restored,
                    error = %e,
                    "Active changes could not be moved to re-created record"
                ),
            }
        }

        tracing::info!(
            plan_id = %change.plan_id,
            change_id = %change.id,
            %table,
            record_id = %change.record_id,
            action_type = %change.action_type,
            "Change reverted"
        );
        let mut payload = serde_json::json!({
            "table": change.table_name,
            "record_id": change.record_id,
            "action_type": change.action_type,
        });
        if let Some(id) = restored_record_id {
            payload["restored_record_id"] = serde_json::json!(id);
        }
        self.activity.record(
            ActivityEvent::new(ActivityKind::ChangeReverted, change.plan_id, &caller.actor)
                .with_change(change.id)
                .with_payload(payload),
        );

        Ok(ChangeRevert {
            change_id: change.id,
            status: ChangeRevertStatus::Reverted,
            restored_record_id,
        })
    }

    async fn release_change_claim(&self, change_id: ChangeId) {
        if let Err(e) = self.plans.release_change(change_id).await {
            tracing::warn!(%change_id, error = %e, "Change claim could not be released");
        }
    }

    async fn apply_inverse(
        &self,
        table: ContentTable,
        change: &Change,
    ) -> Result<Option<RecordId>, CoreError> {
        let conflict = |reason: String| CoreError::RevertConflict {
            change_id: change.id,
            reason,
        };

        match change.action_type {
            ActionKind::Create => {
                let inverse = Action {
                    kind: ActionKind::Delete,
                    table: change.table_name.clone(),
                    record_id: Some(RecordRef::Id(change.record_id)),
                    data: Default::default(),
                    description: format!("Undo: {}", change.description),
                };
                match ActionExecutor::new(self.content).execute(&inverse).await {
                    Ok(_) => Ok(None),
                    Err(CoreError::NotFound { .. }) => Err(conflict(format!(
                        "Created {table} record {} no longer exists",
                        change.record_id
                    ))),
                    Err(e) => Err(e),
                }
            }
            ActionKind::Update => {
                let previous = change
                    .previous_data
                    .as_ref()
                    .ok_or_else(|| conflict("Update change has no previous snapshot".to_string()))?;
                self.content
                    .update(table, change.record_id, tables::without_id(previous))
                    .await?
                    .ok_or_else(|| {
                        conflict(format!(
                            "Updated {table} record {} no longer exists",
                            change.record_id
                        ))
                    })?;
                Ok(None)
            }
            ActionKind::Delete => {
                let previous = change
                    .previous_data
                    .as_ref()
                    .ok_or_else(|| conflict("Delete change has no previous snapshot".to_string()))?;
                let inserted = self
                    .content
                    .insert(table, tables::without_id(previous))
                    .await
                    .map_err(|e| conflict(format!("Record could not be re-created: {e}")))?;
                executor::record_id_of(&inserted).map(Some)
            }
        }
    }

    /// Move an executed plan to `reverted` once it has no active change left.
    async fn settle_plan(&self, plan_id: PlanId, caller: &Caller) -> Result<(), CoreError> {
        let Some(plan) = self.plans.find_plan(plan_id).await? else {
            return Ok(());
        };
        if plan.status != PlanStatus::Executed {
            return Ok(());
        }
        let changes = self.plans.list_changes(plan_id).await?;
        if changes.iter().any(|c| !c.reverted) {
            return Ok(());
        }

        if self.plans.mark_reverted(plan_id, chrono::Utc::now()).await? {
            tracing::info!(%plan_id, "Last active change reverted, plan marked reverted");
            self.activity.record(
                ActivityEvent::new(ActivityKind::PlanReverted, plan_id, &caller.actor)
                    .with_payload(serde_json::json!({ "reverted_count": changes.len() })),
            );
        }
        Ok(())
    }
}
