use std::sync::Arc;

use folio_assistant::CompletionClient;
use folio_db::{DbPool, PgContentStore, PgPlanStore};
use folio_events::ActivityBus;

use crate::config::ServerConfig;

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<ServerConfig>,
    pub content: PgContentStore,
    pub plans: PgPlanStore,
    /// Activity events published by the engines; persisted in the background.
    pub activity: Arc<ActivityBus>,
    pub completion: Arc<dyn CompletionClient>,
}

impl AppState {
    /// Build the state around `pool`, wiring both Postgres stores to it.
    pub fn new(
        pool: DbPool,
        config: Arc<ServerConfig>,
        activity: Arc<ActivityBus>,
        completion: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            content: PgContentStore::new(pool.clone()),
            plans: PgPlanStore::new(pool.clone()),
            pool,
            config,
            activity,
            completion,
        }
    }
}
