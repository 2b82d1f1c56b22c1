//! PostgreSQL implementations of the `folio-core` store traits.

use std::collections::BTreeMap;

use async_trait::async_trait;
use folio_core::change::Change;
use folio_core::plan::{ContentPlan, PlanStatus};
use folio_core::snapshot::TableStats;
use folio_core::store::{ContentStore, PlanStore, StoreError};
use folio_core::tables::ContentTable;
use folio_core::types::{ChangeId, PlanId, Record, RecordId, Timestamp};

use crate::repositories::{ContentChangeRepo, ContentPlanRepo, ContentRecordRepo};
use crate::DbPool;

fn backend(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(db) => StoreError::Backend(db.message().to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Content tables backed by PostgreSQL.
#[derive(Clone)]
pub struct PgContentStore {
    pool: DbPool,
}

impl PgContentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn fetch(&self, table: ContentTable, id: RecordId) -> Result<Option<Record>, StoreError> {
        ContentRecordRepo::find_by_id(&self.pool, table, id)
            .await
            .map_err(backend)
    }

    async fn insert(&self, table: ContentTable, fields: Record) -> Result<Record, StoreError> {
        ContentRecordRepo::create(&self.pool, table, &fields)
            .await
            .map_err(backend)
    }

    async fn update(
        &self,
        table: ContentTable,
        id: RecordId,
        fields: Record,
    ) -> Result<Option<Record>, StoreError> {
        ContentRecordRepo::update(&self.pool, table, id, &fields)
            .await
            .map_err(backend)
    }

    async fn delete(&self, table: ContentTable, id: RecordId) -> Result<bool, StoreError> {
        ContentRecordRepo::delete(&self.pool, table, id)
            .await
            .map_err(backend)
    }

    async fn stats(&self, table: ContentTable) -> Result<TableStats, StoreError> {
        let total = ContentRecordRepo::count(&self.pool, table)
            .await
            .map_err(backend)?;
        let by_status: BTreeMap<String, i64> = match table.schema().status_field {
            Some(field) => ContentRecordRepo::count_by_status(&self.pool, table, field)
                .await
                .map_err(backend)?
                .into_iter()
                .collect(),
            None => BTreeMap::new(),
        };
        Ok(TableStats {
            table,
            total,
            by_status,
        })
    }
}

// ---------------------------------------------------------------------------
// Plans and changes
// ---------------------------------------------------------------------------

/// Plan and change history backed by PostgreSQL.
#[derive(Clone)]
pub struct PgPlanStore {
    pool: DbPool,
}

impl PgPlanStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn insert_plan(&self, plan: &ContentPlan) -> Result<(), StoreError> {
        ContentPlanRepo::create(&self.pool, plan)
            .await
            .map_err(backend)
    }

    async fn find_plan(&self, id: PlanId) -> Result<Option<ContentPlan>, StoreError> {
        ContentPlanRepo::find_by_id(&self.pool, id)
            .await
            .map_err(backend)?
            .map(|row| row.into_plan())
            .transpose()
    }

    async fn list_plans(&self, limit: i64, offset: i64) -> Result<Vec<ContentPlan>, StoreError> {
        ContentPlanRepo::list(&self.pool, limit, offset)
            .await
            .map_err(backend)?
            .into_iter()
            .map(|row| row.into_plan())
            .collect()
    }

    async fn claim_plan(
        &self,
        id: PlanId,
        status: PlanStatus,
        at: Timestamp,
        stale_before: Timestamp,
    ) -> Result<bool, StoreError> {
        ContentPlanRepo::claim(&self.pool, id, status, at, stale_before)
            .await
            .map_err(backend)
    }

    async fn release_plan(&self, id: PlanId) -> Result<(), StoreError> {
        ContentPlanRepo::release(&self.pool, id)
            .await
            .map_err(backend)
    }

    async fn mark_executed(&self, id: PlanId, at: Timestamp) -> Result<bool, StoreError> {
        ContentPlanRepo::transition(&self.pool, id, PlanStatus::Proposed, PlanStatus::Executed, at)
            .await
            .map_err(backend)
    }

    async fn mark_reverted(&self, id: PlanId, at: Timestamp) -> Result<bool, StoreError> {
        ContentPlanRepo::transition(&self.pool, id, PlanStatus::Executed, PlanStatus::Reverted, at)
            .await
            .map_err(backend)
    }

    async fn list_orphaned_plans(&self) -> Result<Vec<ContentPlan>, StoreError> {
        ContentPlanRepo::list_orphaned(&self.pool)
            .await
            .map_err(backend)?
            .into_iter()
            .map(|row| row.into_plan())
            .collect()
    }

    async fn insert_change(&self, change: &Change) -> Result<(), StoreError> {
        ContentChangeRepo::create(&self.pool, change)
            .await
            .map_err(backend)
    }

    async fn find_change(&self, id: ChangeId) -> Result<Option<Change>, StoreError> {
        ContentChangeRepo::find_by_id(&self.pool, id)
            .await
            .map_err(backend)?
            .map(|row| row.into_change())
            .transpose()
    }

    async fn list_changes(&self, plan_id: PlanId) -> Result<Vec<Change>, StoreError> {
        ContentChangeRepo::list_by_plan(&self.pool, plan_id)
            .await
            .map_err(backend)?
            .into_iter()
            .map(|row| row.into_change())
            .collect()
    }

    async fn claim_change(
        &self,
        id: ChangeId,
        at: Timestamp,
        stale_before: Timestamp,
    ) -> Result<bool, StoreError> {
        ContentChangeRepo::claim(&self.pool, id, at, stale_before)
            .await
            .map_err(backend)
    }

    async fn release_change(&self, id: ChangeId) -> Result<(), StoreError> {
        ContentChangeRepo::release(&self.pool, id)
            .await
            .map_err(backend)
    }

    async fn mark_change_reverted(&self, id: ChangeId, at: Timestamp) -> Result<bool, StoreError> {
        ContentChangeRepo::mark_reverted(&self.pool, id, at)
            .await
            .map_err(backend)
    }

    async fn retarget_changes(
        &self,
        table: ContentTable,
        from: RecordId,
        to: RecordId,
    ) -> Result<u64, StoreError> {
        ContentChangeRepo::retarget(&self.pool, table.as_str(), from, to)
            .await
            .map_err(backend)
    }
}
