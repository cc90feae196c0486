//! Survey question generation endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::services::question_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateQuestionsRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateQuestionsResponse {
    pub questions: Vec<String>,
}

/// POST /questions/generate
pub async fn generate_questions(
    State(state): State<AppState>,
    Json(request): Json<GenerateQuestionsRequest>,
) -> ApiResult<Json<GenerateQuestionsResponse>> {
    let questions =
        question_service::generate_questions(state.textgen.as_ref(), &request.description).await?;

    Ok(Json(GenerateQuestionsResponse { questions }))
}

/// Build question routes
pub fn question_routes() -> Router<AppState> {
    Router::new().route("/questions/generate", post(generate_questions))
}
