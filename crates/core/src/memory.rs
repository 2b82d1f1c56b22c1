//! In-process store implementations.
//!
//! Used by the unit tests of every engine and by anything that needs the
//! engines without a database.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::activity::{ActivityEvent, ActivitySink};
use crate::change::Change;
use crate::plan::{ContentPlan, PlanStatus};
use crate::snapshot::TableStats;
use crate::store::{ContentStore, PlanStore, StoreError};
use crate::tables::{ContentTable, ID_FIELD};
use crate::types::{ChangeId, PlanId, Record, RecordId, Timestamp};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Content tables held in memory. Counts every call so tests can assert
/// that rejected actions performed no I/O.
#[derive(Default)]
pub struct MemoryContentStore {
    tables: Mutex<HashMap<ContentTable, BTreeMap<RecordId, Record>>>,
    io_calls: AtomicUsize,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    /// Insert a record directly (no I/O accounting) and return its id.
    ///
    /// Panics if `record` is not a JSON object.
    pub fn seed(&self, table: ContentTable, record: serde_json::Value) -> RecordId {
        let mut fields = record.as_object().cloned().expect("seed record must be an object");
        let id = Uuid::new_v4();
        fields.insert(ID_FIELD.to_string(), serde_json::Value::String(id.to_string()));
        self.tables
            .lock()
            .expect("memory store lock poisoned")
            .entry(table)
            .or_default()
            .insert(id, fields);
        id
    }

    #[cfg(test)]
    /// Current record, bypassing I/O accounting.
    pub fn get(&self, table: ContentTable, id: RecordId) -> Option<Record> {
        self.tables
            .lock()
            .expect("memory store lock poisoned")
            .get(&table)
            .and_then(|rows| rows.get(&id).cloned())
    }

    #[cfg(test)]
    /// Number of rows in `table`, bypassing I/O accounting.
    pub fn count(&self, table: ContentTable) -> usize {
        self.tables
            .lock()
            .expect("memory store lock poisoned")
            .get(&table)
            .map_or(0, BTreeMap::len)
    }

    #[cfg(test)]
    /// Number of trait calls served so far.
    pub fn io_calls(&self) -> usize {
        self.io_calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.io_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn fetch(&self, table: ContentTable, id: RecordId) -> Result<Option<Record>, StoreError> {
        self.touch();
        Ok(lock(&self.tables)?
            .get(&table)
            .and_then(|rows| rows.get(&id).cloned()))
    }

    async fn insert(&self, table: ContentTable, mut fields: Record) -> Result<Record, StoreError> {
        self.touch();
        let id = Uuid::new_v4();
        fields.insert(ID_FIELD.to_string(), serde_json::Value::String(id.to_string()));
        lock(&self.tables)?
            .entry(table)
            .or_default()
            .insert(id, fields.clone());
        Ok(fields)
    }

    async fn update(
        &self,
        table: ContentTable,
        id: RecordId,
        fields: Record,
    ) -> Result<Option<Record>, StoreError> {
        self.touch();
        let mut tables = lock(&self.tables)?;
        let Some(row) = tables.get_mut(&table).and_then(|rows| rows.get_mut(&id)) else {
            return Ok(None);
        };
        for (name, value) in fields {
            if name != ID_FIELD {
                row.insert(name, value);
            }
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, table: ContentTable, id: RecordId) -> Result<bool, StoreError> {
        self.touch();
        Ok(lock(&self.tables)?
            .get_mut(&table)
            .and_then(|rows| rows.remove(&id))
            .is_some())
    }

    async fn stats(&self, table: ContentTable) -> Result<TableStats, StoreError> {
        self.touch();
        let tables = lock(&self.tables)?;
        let rows = tables.get(&table);
        let total = rows.map_or(0, BTreeMap::len) as i64;
        let mut by_status = BTreeMap::new();
        if let (Some(field), Some(rows)) = (table.schema().status_field, rows) {
            for row in rows.values() {
                let key = match row.get(field) {
                    None | Some(serde_json::Value::Null) => "null".to_string(),
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                };
                *by_status.entry(key).or_insert(0) += 1;
            }
        }
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

/// Plans and changes held in memory, with a switch that makes change
/// inserts fail so the fatal history path can be exercised.
///
/// Lock order: `plans`, `changes`, then the claim maps.
#[derive(Default)]
pub struct MemoryPlanStore {
    plans: Mutex<Vec<ContentPlan>>,
    changes: Mutex<Vec<Change>>,
    plan_claims: Mutex<HashMap<PlanId, Timestamp>>,
    change_claims: Mutex<HashMap<ChangeId, Timestamp>>,
    fail_change_inserts: AtomicBool,
}

/// Take `id` in `claims` unless a claim newer than `stale_before` holds it.
fn take_claim<K: Eq + std::hash::Hash>(
    claims: &mut HashMap<K, Timestamp>,
    id: K,
    at: Timestamp,
    stale_before: Timestamp,
) -> bool {
    match claims.get(&id) {
        Some(held) if *held >= stale_before => false,
        _ => {
            claims.insert(id, at);
            true
        }
    }
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn fail_change_inserts(&self, fail: bool) {
        self.fail_change_inserts.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn change_count(&self) -> usize {
        self.changes.lock().expect("memory store lock poisoned").len()
    }

    fn transition(
        &self,
        id: PlanId,
        from: PlanStatus,
        to: PlanStatus,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        let mut plans = lock(&self.plans)?;
        let Some(plan) = plans.iter_mut().find(|p| p.id == id && p.status == from) else {
            return Ok(false);
        };
        plan.status = to;
        lock(&self.plan_claims)?.remove(&id);
        match to {
            PlanStatus::Executed => plan.executed_at = Some(at),
            PlanStatus::Reverted => plan.reverted_at = Some(at),
            PlanStatus::Proposed => {}
        }
        Ok(true)
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn insert_plan(&self, plan: &ContentPlan) -> Result<(), StoreError> {
        lock(&self.plans)?.push(plan.clone());
        Ok(())
    }

    async fn find_plan(&self, id: PlanId) -> Result<Option<ContentPlan>, StoreError> {
        Ok(lock(&self.plans)?.iter().find(|p| p.id == id).cloned())
    }

    async fn list_plans(&self, limit: i64, offset: i64) -> Result<Vec<ContentPlan>, StoreError> {
        let plans = lock(&self.plans)?;
        Ok(plans
            .iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn claim_plan(
        &self,
        id: PlanId,
        status: PlanStatus,
        at: Timestamp,
        stale_before: Timestamp,
    ) -> Result<bool, StoreError> {
        let plans = lock(&self.plans)?;
        if !plans.iter().any(|p| p.id == id && p.status == status) {
            return Ok(false);
        }
        Ok(take_claim(&mut *lock(&self.plan_claims)?, id, at, stale_before))
    }

    async fn release_plan(&self, id: PlanId) -> Result<(), StoreError> {
        lock(&self.plan_claims)?.remove(&id);
        Ok(())
    }

    async fn mark_executed(&self, id: PlanId, at: Timestamp) -> Result<bool, StoreError> {
        self.transition(id, PlanStatus::Proposed, PlanStatus::Executed, at)
    }

    async fn mark_reverted(&self, id: PlanId, at: Timestamp) -> Result<bool, StoreError> {
        self.transition(id, PlanStatus::Executed, PlanStatus::Reverted, at)
    }

    async fn list_orphaned_plans(&self) -> Result<Vec<ContentPlan>, StoreError> {
        let plans = lock(&self.plans)?;
        let changes = lock(&self.changes)?;
        Ok(plans
            .iter()
            .rev()
            .filter(|p| p.status == PlanStatus::Proposed)
            .filter(|p| changes.iter().any(|c| c.plan_id == p.id))
            .cloned()
            .collect())
    }

    async fn insert_change(&self, change: &Change) -> Result<(), StoreError> {
        if self.fail_change_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("change history unavailable".to_string()));
        }
        lock(&self.changes)?.push(change.clone());
        Ok(())
    }

    async fn find_change(&self, id: ChangeId) -> Result<Option<Change>, StoreError> {
        Ok(lock(&self.changes)?.iter().find(|c| c.id == id).cloned())
    }

    async fn list_changes(&self, plan_id: PlanId) -> Result<Vec<Change>, StoreError> {
        let mut changes: Vec<Change> = lock(&self.changes)?
            .iter()
            .filter(|c| c.plan_id == plan_id)
            .cloned()
            .collect();
        changes.sort_by_key(|c| c.action_index);
        Ok(changes)
    }

    async fn claim_change(
        &self,
        id: ChangeId,
        at: Timestamp,
        stale_before: Timestamp,
    ) -> Result<bool, StoreError> {
        let changes = lock(&self.changes)?;
        if !changes.iter().any(|c| c.id == id && !c.reverted) {
            return Ok(false);
        }
        Ok(take_claim(&mut *lock(&self.change_claims)?, id, at, stale_before))
    }

    async fn release_change(&self, id: ChangeId) -> Result<(), StoreError> {
        lock(&self.change_claims)?.remove(&id);
        Ok(())
    }

    async fn mark_change_reverted(&self, id: ChangeId, at: Timestamp) -> Result<bool, StoreError> {
        let mut changes = lock(&self.changes)?;
        match changes.iter_mut().find(|c| c.id == id && !c.reverted) {
            Some(change) => {
                change.reverted = true;
                change.reverted_at = Some(at);
                lock(&self.change_claims)?.remove(&id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn retarget_changes(
        &self,
        table: ContentTable,
        from: RecordId,
        to: RecordId,
    ) -> Result<u64, StoreError> {
        let mut moved = 0;
        for change in lock(&self.changes)?.iter_mut() {
            if !change.reverted && change.record_id == from && change.table_name == table.as_str() {
                change.record_id = to;
                moved += 1;
            }
        }
        Ok(moved)
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// Sink that keeps every event for later inspection.
#[derive(Default)]
pub struct RecordingActivitySink {
    events: Mutex<Vec<ActivityEvent>>,
}

impl RecordingActivitySink {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().expect("activity sink lock poisoned").clone()
    }
}

impl ActivitySink for RecordingActivitySink {
    fn record(&self, event: ActivityEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
