//! In-process activity bus backed by a `tokio::sync::broadcast` channel.

use folio_core::activity::{ActivityEvent, ActivitySink};
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out hub for [`ActivityEvent`]s, shared via `Arc<ActivityBus>`.
///
/// ```rust
/// use folio_core::activity::{ActivityEvent, ActivityKind};
/// use folio_events::ActivityBus;
///
/// let bus = ActivityBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ActivityEvent::new(ActivityKind::PlanCreated, uuid::Uuid::new_v4(), "owner"));
/// ```
pub struct ActivityBus {
    sender: broadcast::Sender<ActivityEvent>,
}

impl ActivityBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped when nobody listens.
    pub fn publish(&self, event: ActivityEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActivityEvent> {
        self.sender.subscribe()
    }
}

impl Default for ActivityBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ActivitySink for ActivityBus {
    fn record(&self, event: ActivityEvent) {
        tracing::debug!(
            event_type = event.kind.as_str(),
            plan_id = %event.plan_id,
            "Activity published"
        );
        self.publish(event);
    }
}
