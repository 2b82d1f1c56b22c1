//! Durable activity persistence.
//!
//! [`ActivityPersistence`] subscribes to the [`ActivityBus`](crate::bus::ActivityBus)
//! and appends every event to `admin_activity`. It runs as a long-lived
//! background task and exits when the bus sender is dropped.

use folio_core::activity::ActivityEvent;
use folio_db::repositories::ActivityRepo;
use folio_db::DbPool;
use tokio::sync::broadcast;

pub struct ActivityPersistence;

impl ActivityPersistence {
    /// Run the persistence loop until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<ActivityEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = event.kind.as_str(),
                            plan_id = %event.plan_id,
                            "Failed to persist activity"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Activity persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Activity bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    async fn persist(pool: &DbPool, event: &ActivityEvent) -> Result<i64, sqlx::Error> {
        ActivityRepo::insert(pool, event).await
    }
}
