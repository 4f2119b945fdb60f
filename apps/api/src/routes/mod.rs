pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::report::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/projects", get(handlers::handle_list_projects))
        .route(
            "/api/v1/projects/:project_id/milestones",
            get(handlers::handle_list_milestones),
        )
        .route(
            "/api/v1/projects/:project_id/milestones/:milestone_id/summary",
            get(handlers::handle_milestone_summary),
        )
        .route("/api/v1/summary", post(handlers::handle_multi_project_summary))
        .with_state(state)
}
