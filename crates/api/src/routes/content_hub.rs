//! Route definitions for the `/admin/content-hub` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::content_hub;
use crate::state::AppState;

/// Routes mounted at `/admin/content-hub`.
///
/// ```text
/// POST   /chat                    -> chat
/// GET    /snapshot                -> snapshot
/// GET    /plans                   -> list_plans (?limit, offset)
/// POST   /plans                   -> create_plan
/// GET    /plans/orphaned          -> orphaned_plans
/// GET    /plans/{id}              -> get_plan
/// POST   /plans/{id}/execute      -> execute_plan
/// POST   /plans/{id}/revert       -> revert_plan
/// POST   /changes/{id}/revert     -> revert_change
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(content_hub::chat))
        .route("/snapshot", get(content_hub::snapshot))
        .route(
            "/plans",
            get(content_hub::list_plans).post(content_hub::create_plan),
        )
        .route("/plans/orphaned", get(content_hub::orphaned_plans))
        .route("/plans/{id}", get(content_hub::get_plan))
        .route("/plans/{id}/execute", post(content_hub::execute_plan))
        .route("/plans/{id}/revert", post(content_hub::revert_plan))
        .route("/changes/{id}/revert", post(content_hub::revert_change))
}
