use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::project::{MilestoneRef, ProjectRef};
use crate::report::builder::{MilestoneReport, ReportBuilder};
use crate::state::AppState;

/// GET /api/v1/projects
pub async fn handle_list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectRef>>, AppError> {
    let projects = state.tracker.list_projects().await?;
    Ok(Json(projects))
}

/// GET /api/v1/projects/:project_id/milestones
pub async fn handle_list_milestones(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<MilestoneRef>>, AppError> {
    let milestones = state.tracker.list_active_milestones(project_id).await?;
    Ok(Json(milestones))
}

/// GET /api/v1/projects/:project_id/milestones/:milestone_id/summary
pub async fn handle_milestone_summary(
    State(state): State<AppState>,
    Path((project_id, milestone_id)): Path<(i64, i64)>,
) -> Result<Json<MilestoneReport>, AppError> {
    let builder = ReportBuilder::new(state.tracker.as_ref(), state.narrator.as_deref());
    let report = builder.single_project(project_id, milestone_id).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct MultiProjectSummaryRequest {
    pub project_ids: Vec<i64>,
    pub milestone_title: String,
}

/// POST /api/v1/summary
pub async fn handle_multi_project_summary(
    State(state): State<AppState>,
    Json(req): Json<MultiProjectSummaryRequest>,
) -> Result<Json<MilestoneReport>, AppError> {
    if req.project_ids.is_empty() {
        return Err(AppError::Validation(
            "project_ids must not be empty".to_string(),
        ));
    }

    let builder = ReportBuilder::new(state.tracker.as_ref(), state.narrator.as_deref());
    let report = builder
        .multi_project(&req.project_ids, &req.milestone_title)
        .await?;
    Ok(Json(report))
}
