//! Mission report endpoints

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::db::reports;
use crate::error::{ApiError, ApiResult};
use crate::services::report_service;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report_id: Uuid,
    pub mission_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub source_submission_count: i64,
    pub questions_hash: String,
    pub model: String,
    pub sections: Value,
}

/// POST /missions/:id/report
pub async fn generate_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReportResponse>> {
    let generated =
        report_service::generate_full_report(&state.db, state.textgen.as_ref(), id).await?;

    let sections = serde_json::to_value(&generated.sections)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(ReportResponse {
        report_id: generated.report.id,
        mission_id: generated.report.mission_id,
        generated_at: generated.report.generated_at,
        source_submission_count: generated.report.source_submission_count,
        questions_hash: generated.report.questions_hash,
        model: generated.report.model,
        sections,
    }))
}

/// GET /missions/:id/report - latest stored report, if any
pub async fn latest_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReportResponse>> {
    let report = reports::latest_for_mission(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No report for mission {}", id)))?;

    let sections: Value = serde_json::from_str(&report.ai_output)
        .map_err(|e| ApiError::Internal(format!("Stored report is unreadable: {}", e)))?;

    Ok(Json(ReportResponse {
        report_id: report.id,
        mission_id: report.mission_id,
        generated_at: report.generated_at,
        source_submission_count: report.source_submission_count,
        questions_hash: report.questions_hash,
        model: report.model,
        sections,
    }))
}

/// Build report routes
pub fn report_routes() -> Router<AppState> {
    Router::new().route("/missions/:id/report", post(generate_report).get(latest_report))
}
