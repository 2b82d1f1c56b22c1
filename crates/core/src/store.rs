//! Storage seams consumed by the engines.
//!
//! [`ContentStore`] is the per-table select/insert/update/delete surface of
//! the relational content store. [`PlanStore`] persists plans and their
//! change history.

use async_trait::async_trait;

use crate::change::Change;
use crate::plan::{ContentPlan, PlanStatus};
use crate::snapshot::TableStats;
use crate::tables::ContentTable;
use crate::types::{ChangeId, PlanId, Record, RecordId, Timestamp};

/// Lifetime of a claim on a plan or change. Older claims are treated as
/// abandoned by a crashed caller and may be taken over.
pub const CLAIM_TTL_SECS: i64 = 15 * 60;

/// Claims taken before this instant no longer block a new claim at `at`.
pub fn claim_stale_before(at: Timestamp) -> Timestamp {
    at - chrono::Duration::seconds(CLAIM_TTL_SECS)
}

/// Failure reported by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Stored data is malformed: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read one record by id.
    async fn fetch(&self, table: ContentTable, id: RecordId) -> Result<Option<Record>, StoreError>;

    /// Insert a record. The store assigns the id; the returned record
    /// includes it together with any defaulted columns.
    async fn insert(&self, table: ContentTable, fields: Record) -> Result<Record, StoreError>;

    /// Overwrite the given fields, leaving the others untouched. Returns the
    /// full record after the write, or `None` when no record has that id.
    async fn update(
        &self,
        table: ContentTable,
        id: RecordId,
        fields: Record,
    ) -> Result<Option<Record>, StoreError>;

    /// Delete a record. Returns `false` when no record has that id.
    async fn delete(&self, table: ContentTable, id: RecordId) -> Result<bool, StoreError>;

    /// Row count, broken down by the table's status field when it has one.
    async fn stats(&self, table: ContentTable) -> Result<TableStats, StoreError>;
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn insert_plan(&self, plan: &ContentPlan) -> Result<(), StoreError>;

    async fn find_plan(&self, id: PlanId) -> Result<Option<ContentPlan>, StoreError>;

    /// Plans ordered most recent first.
    async fn list_plans(&self, limit: i64, offset: i64) -> Result<Vec<ContentPlan>, StoreError>;

    /// Take the exclusive claim on a plan that is in `status`.
    ///
    /// Returns `false` when the plan is not in `status` or another caller
    /// holds a claim taken at or after `stale_before`.
    async fn claim_plan(
        &self,
        id: PlanId,
        status: PlanStatus,
        at: Timestamp,
        stale_before: Timestamp,
    ) -> Result<bool, StoreError>;

    async fn release_plan(&self, id: PlanId) -> Result<(), StoreError>;

    /// `proposed` -> `executed`, releasing any claim. Returns `false` if the
    /// plan was not `proposed`.
    async fn mark_executed(&self, id: PlanId, at: Timestamp) -> Result<bool, StoreError>;

    /// `executed` -> `reverted`, releasing any claim. Returns `false` if the
    /// plan was not `executed`.
    async fn mark_reverted(&self, id: PlanId, at: Timestamp) -> Result<bool, StoreError>;

    /// Plans still `proposed` that already own change entries.
    async fn list_orphaned_plans(&self) -> Result<Vec<ContentPlan>, StoreError>;

    async fn insert_change(&self, change: &Change) -> Result<(), StoreError>;

    async fn find_change(&self, id: ChangeId) -> Result<Option<Change>, StoreError>;

    /// Changes of a plan in execution order.
    async fn list_changes(&self, plan_id: PlanId) -> Result<Vec<Change>, StoreError>;

    /// Take the exclusive claim on an active change. Same rules as
    /// [`PlanStore::claim_plan`]; reverted changes cannot be claimed.
    async fn claim_change(
        &self,
        id: ChangeId,
        at: Timestamp,
        stale_before: Timestamp,
    ) -> Result<bool, StoreError>;

    async fn release_change(&self, id: ChangeId) -> Result<(), StoreError>;

    /// Set the reverted flag and release any claim. Returns `false` if the
    /// flag was already set.
    async fn mark_change_reverted(&self, id: ChangeId, at: Timestamp) -> Result<bool, StoreError>;

    /// Point every active change on record `from` of `table` at `to`, after
    /// a deleted record was re-created under a new id. Returns how many
    /// changes moved.
    async fn retarget_changes(
        &self,
        table: ContentTable,
        from: RecordId,
        to: RecordId,
    ) -> Result<u64, StoreError>;
}
