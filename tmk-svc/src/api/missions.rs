//! Mission creation, submission, and reconciliation endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::missions::{self, Mission, MissionCount};
use crate::db::submissions::AnswerEntry;
use crate::error::{ApiError, ApiResult};
use crate::services::mission_service::{self, NewMission};
use crate::AppState;

/// POST /missions
pub async fn create_mission(
    State(state): State<AppState>,
    Json(request): Json<NewMission>,
) -> ApiResult<Json<Mission>> {
    let mission = mission_service::create_mission(&state.db, request).await?;

    Ok(Json(mission))
}

/// GET /missions/:id
pub async fn get_mission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Mission>> {
    let mission = missions::get_mission(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Mission {} not found", id)))?;

    Ok(Json(mission))
}

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub tester_id: String,
    #[serde(default)]
    pub tester_name: String,
    pub answers: Vec<AnswerEntry>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub submission_id: Uuid,
    pub submission_count: Option<i64>,
    pub mission_completed: bool,
}

/// POST /missions/:id/submissions
pub async fn create_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmissionRequest>,
) -> ApiResult<Json<SubmissionResponse>> {
    let outcome = mission_service::record_submission(
        &state.db,
        state.notifier.as_ref(),
        id,
        &request.tester_id,
        &request.tester_name,
        request.answers,
    )
    .await?;

    Ok(Json(SubmissionResponse {
        submission_id: outcome.submission_id,
        submission_count: outcome.new_count,
        mission_completed: outcome.completed,
    }))
}

/// POST /missions/recalculate
pub async fn recalculate_counts(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<MissionCount>>> {
    let counts = mission_service::recalculate_counts(&state.db).await?;

    Ok(Json(counts))
}

/// Build mission routes
pub fn mission_routes() -> Router<AppState> {
    Router::new()
        .route("/missions", post(create_mission))
        .route("/missions/recalculate", post(recalculate_counts))
        .route("/missions/:id", get(get_mission))
        .route("/missions/:id/submissions", post(create_submission))
}
