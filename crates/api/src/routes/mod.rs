pub mod content_hub;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /admin/content-hub/chat                    propose a plan (POST)
/// /admin/content-hub/snapshot                site statistics (GET)
/// /admin/content-hub/plans                   history (GET), accept (POST)
/// /admin/content-hub/plans/orphaned          interrupted executions (GET)
/// /admin/content-hub/plans/{id}              detail (GET)
/// /admin/content-hub/plans/{id}/execute      execute (POST)
/// /admin/content-hub/plans/{id}/revert       revert whole plan (POST)
/// /admin/content-hub/changes/{id}/revert     revert one change (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/admin/content-hub", content_hub::router())
}
