//! Integration tests for plan and change persistence.

use chrono::{Duration, Utc};
use folio_core::action::ActionKind;
use folio_core::activity::{ActivityEvent, ActivityKind};
use folio_core::change::Change;
use folio_core::plan::{ContentPlan, PlanStatus};
use folio_core::store::{claim_stale_before, PlanStore};
use folio_core::tables::ContentTable;
use folio_db::repositories::ActivityRepo;
use folio_db::PgPlanStore;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_plan(title: &str, minutes_ago: i64) -> ContentPlan {
    ContentPlan {
        id: Uuid::new_v4(),
        title: title.to_string(),
        summary: "summary".to_string(),
        actions: vec![serde_json::from_value(json!({
            "type": "create", "table": "skills",
            "data": {"name": "Rust", "category": "lang"}, "description": "add"
        }))
        .unwrap()],
        status: PlanStatus::Proposed,
        created_at: Utc::now() - Duration::minutes(minutes_ago),
        executed_at: None,
        reverted_at: None,
    }
}

fn new_change(plan_id: Uuid, index: i32) -> Change {
    Change {
        id: Uuid::new_v4(),
        plan_id,
        action_index: index,
        table_name: "skills".to_string(),
        record_id: Uuid::new_v4(),
        action_type: ActionKind::Update,
        description: format!("change {index}"),
        previous_data: json!({"name": "Go"}).as_object().cloned(),
        new_data: json!({"name": "Rust"}).as_object().cloned(),
        reverted: false,
        reverted_at: None,
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_plan_round_trip(pool: PgPool) {
    let store = PgPlanStore::new(pool);
    let plan = new_plan("Round trip", 0);

    store.insert_plan(&plan).await.unwrap();
    let found = store.find_plan(plan.id).await.unwrap().unwrap();

    assert_eq!(found.title, plan.title);
    assert_eq!(found.actions, plan.actions);
    assert_eq!(found.status, PlanStatus::Proposed);
    assert!(store.find_plan(Uuid::new_v4()).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_transitions_are_conditional(pool: PgPool) {
    let store = PgPlanStore::new(pool);
    let plan = new_plan("Lifecycle", 0);
    store.insert_plan(&plan).await.unwrap();

    assert!(!store.mark_reverted(plan.id, Utc::now()).await.unwrap());
    assert!(store.mark_executed(plan.id, Utc::now()).await.unwrap());
    assert!(!store.mark_executed(plan.id, Utc::now()).await.unwrap());
    assert!(store.mark_reverted(plan.id, Utc::now()).await.unwrap());

    let found = store.find_plan(plan.id).await.unwrap().unwrap();
    assert_eq!(found.status, PlanStatus::Reverted);
    assert!(found.executed_at.is_some());
    assert!(found.reverted_at.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_plans_newest_first(pool: PgPool) {
    let store = PgPlanStore::new(pool);
    let old = new_plan("Old", 30);
    let mid = new_plan("Mid", 20);
    let new = new_plan("New", 10);
    for plan in [&mid, &old, &new] {
        store.insert_plan(plan).await.unwrap();
    }

    let page: Vec<Uuid> = store
        .list_plans(2, 0)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(page, vec![new.id, mid.id]);

    let rest = store.list_plans(2, 2).await.unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].id, old.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_orphaned_plans(pool: PgPool) {
    let store = PgPlanStore::new(pool);
    let orphan = new_plan("Interrupted", 5);
    let pending = new_plan("Pending", 4);
    let done = new_plan("Done", 3);
    for plan in [&orphan, &pending, &done] {
        store.insert_plan(plan).await.unwrap();
    }
    store.insert_change(&new_change(orphan.id, 0)).await.unwrap();
    store.insert_change(&new_change(done.id, 0)).await.unwrap();
    store.mark_executed(done.id, Utc::now()).await.unwrap();

    let orphaned = store.list_orphaned_plans().await.unwrap();
    assert_eq!(orphaned.len(), 1);
    assert_eq!(orphaned[0].id, orphan.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_plan_claim_is_exclusive_until_stale(pool: PgPool) {
    let store = PgPlanStore::new(pool);
    let plan = new_plan("Claimed", 0);
    store.insert_plan(&plan).await.unwrap();
    let now = Utc::now();

    assert!(!store
        .claim_plan(plan.id, PlanStatus::Executed, now, claim_stale_before(now))
        .await
        .unwrap());
    assert!(store
        .claim_plan(plan.id, PlanStatus::Proposed, now, claim_stale_before(now))
        .await
        .unwrap());
    assert!(!store
        .claim_plan(plan.id, PlanStatus::Proposed, now, claim_stale_before(now))
        .await
        .unwrap());

    let later = now + Duration::hours(1);
    assert!(store
        .claim_plan(plan.id, PlanStatus::Proposed, later, claim_stale_before(later))
        .await
        .unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_plan_claim_released_by_release_and_transition(pool: PgPool) {
    let store = PgPlanStore::new(pool);
    let plan = new_plan("Released", 0);
    store.insert_plan(&plan).await.unwrap();
    let now = Utc::now();
    let stale_before = claim_stale_before(now);

    assert!(store
        .claim_plan(plan.id, PlanStatus::Proposed, now, stale_before)
        .await
        .unwrap());
    store.release_plan(plan.id).await.unwrap();
    assert!(store
        .claim_plan(plan.id, PlanStatus::Proposed, now, stale_before)
        .await
        .unwrap());

    assert!(store.mark_executed(plan.id, now).await.unwrap());
    assert!(store
        .claim_plan(plan.id, PlanStatus::Executed, now, stale_before)
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Changes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_changes_listed_in_action_order(pool: PgPool) {
    let store = PgPlanStore::new(pool);
    let plan = new_plan("Ordered", 0);
    store.insert_plan(&plan).await.unwrap();
    for index in [2, 0, 1] {
        store.insert_change(&new_change(plan.id, index)).await.unwrap();
    }

    let indices: Vec<i32> = store
        .list_changes(plan.id)
        .await
        .unwrap()
        .iter()
        .map(|c| c.action_index)
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_snapshots_round_trip(pool: PgPool) {
    let store = PgPlanStore::new(pool);
    let plan = new_plan("Delete", 0);
    store.insert_plan(&plan).await.unwrap();
    let mut change = new_change(plan.id, 0);
    change.action_type = ActionKind::Delete;
    change.new_data = None;
    store.insert_change(&change).await.unwrap();

    let found = store.find_change(change.id).await.unwrap().unwrap();
    assert_eq!(found.action_type, ActionKind::Delete);
    assert_eq!(found.previous_data, change.previous_data);
    assert!(found.new_data.is_none());
    assert!(found.has_consistent_snapshots());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_requires_a_snapshot(pool: PgPool) {
    let store = PgPlanStore::new(pool);
    let plan = new_plan("Broken", 0);
    store.insert_plan(&plan).await.unwrap();
    let mut change = new_change(plan.id, 0);
    change.previous_data = None;
    change.new_data = None;

    assert!(store.insert_change(&change).await.is_err());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mark_change_reverted_once(pool: PgPool) {
    let store = PgPlanStore::new(pool);
    let plan = new_plan("Revert", 0);
    store.insert_plan(&plan).await.unwrap();
    let change = new_change(plan.id, 0);
    store.insert_change(&change).await.unwrap();

    assert!(store.mark_change_reverted(change.id, Utc::now()).await.unwrap());
    assert!(!store.mark_change_reverted(change.id, Utc::now()).await.unwrap());

    let found = store.find_change(change.id).await.unwrap().unwrap();
    assert!(found.reverted);
    assert!(found.reverted_at.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_claim_skips_reverted_changes(pool: PgPool) {
    let store = PgPlanStore::new(pool);
    let plan = new_plan("Claims", 0);
    store.insert_plan(&plan).await.unwrap();
    let change = new_change(plan.id, 0);
    store.insert_change(&change).await.unwrap();
    let now = Utc::now();
    let stale_before = claim_stale_before(now);

    assert!(store.claim_change(change.id, now, stale_before).await.unwrap());
    assert!(!store.claim_change(change.id, now, stale_before).await.unwrap());
    store.release_change(change.id).await.unwrap();
    assert!(store.claim_change(change.id, now, stale_before).await.unwrap());

    assert!(store.mark_change_reverted(change.id, now).await.unwrap());
    assert!(!store.claim_change(change.id, now, stale_before).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_retarget_moves_only_active_changes(pool: PgPool) {
    let store = PgPlanStore::new(pool);
    let first = new_plan("First", 2);
    let second = new_plan("Second", 1);
    store.insert_plan(&first).await.unwrap();
    store.insert_plan(&second).await.unwrap();

    let deleted = Uuid::new_v4();
    let mut active = new_change(first.id, 0);
    active.record_id = deleted;
    let mut other_plan = new_change(second.id, 0);
    other_plan.record_id = deleted;
    let mut undone = new_change(first.id, 1);
    undone.record_id = deleted;
    let mut other_table = new_change(first.id, 2);
    other_table.record_id = deleted;
    other_table.table_name = "projects".to_string();
    for change in [&active, &other_plan, &undone, &other_table] {
        store.insert_change(change).await.unwrap();
    }
    store.mark_change_reverted(undone.id, Utc::now()).await.unwrap();

    let restored = Uuid::new_v4();
    let moved = store
        .retarget_changes(ContentTable::Skills, deleted, restored)
        .await
        .unwrap();

    assert_eq!(moved, 2);
    for (change, expected) in [
        (&active, restored),
        (&other_plan, restored),
        (&undone, deleted),
        (&other_table, deleted),
    ] {
        let found = store.find_change(change.id).await.unwrap().unwrap();
        assert_eq!(found.record_id, expected, "{}", change.description);
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_activity_append_and_list(pool: PgPool) {
    let plan_id = Uuid::new_v4();
    let created = ActivityEvent::new(ActivityKind::PlanCreated, plan_id, "owner")
        .with_payload(json!({"title": "Publish drafts"}));
    let executed = ActivityEvent::new(ActivityKind::PlanExecuted, plan_id, "owner");

    ActivityRepo::insert(&pool, &created).await.unwrap();
    ActivityRepo::insert(&pool, &executed).await.unwrap();

    let rows = ActivityRepo::list_by_plan(&pool, plan_id).await.unwrap();
    let kinds: Vec<&str> = rows.iter().map(|r| r.event_type.as_str()).collect();
    assert_eq!(kinds, vec!["plan.created", "plan.executed"]);
    assert_eq!(rows[0].payload["title"], json!("Publish drafts"));

    let recent = ActivityRepo::list_recent(&pool, 1).await.unwrap();
    assert_eq!(recent[0].event_type, "plan.executed");
}
