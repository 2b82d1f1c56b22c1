//! Integration test for the activity persistence loop.

use std::sync::Arc;

use folio_core::activity::{ActivityEvent, ActivityKind, ActivitySink};
use folio_db::repositories::ActivityRepo;
use folio_events::{ActivityBus, ActivityPersistence};
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "../db/migrations")]
async fn test_persists_events_until_bus_closes(pool: PgPool) {
    let bus = Arc::new(ActivityBus::default());
    let handle = tokio::spawn(ActivityPersistence::run(pool.clone(), bus.subscribe()));
    let plan_id = Uuid::new_v4();

    bus.record(ActivityEvent::new(ActivityKind::PlanCreated, plan_id, "owner"));
    bus.record(
        ActivityEvent::new(ActivityKind::PlanExecuted, plan_id, "owner")
            .with_payload(serde_json::json!({"succeeded_count": 1})),
    );
    drop(bus);
    handle.await.expect("persistence task should finish");

    let rows = ActivityRepo::list_by_plan(&pool, plan_id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].event_type, "plan.created");
    assert_eq!(rows[1].payload["succeeded_count"], 1);
}
