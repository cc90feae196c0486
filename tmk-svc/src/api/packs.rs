//! Pack opening and recent-winners endpoints

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::db::pack_openings::{self, PackOpening};
use crate::error::ApiResult;
use crate::services::pack_service::{self, OpenedPack};
use crate::AppState;

const DEFAULT_RECENT_LIMIT: i64 = 20;
const MAX_RECENT_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct OpenPackRequest {
    pub uid: String,
    #[serde(default)]
    pub is_free: bool,
}

/// POST /packs/open
pub async fn open_pack(
    State(state): State<AppState>,
    Json(request): Json<OpenPackRequest>,
) -> ApiResult<Json<OpenedPack>> {
    // StdRng rather than thread_rng: the handler future must be Send.
    let mut rng = StdRng::from_entropy();
    let opened = pack_service::open_pack(&state.db, &request.uid, request.is_free, &mut rng).await?;

    Ok(Json(opened))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

/// GET /packs/recent?limit=20
pub async fn recent_openings(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<PackOpening>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    let openings = pack_openings::list_recent(&state.db, limit).await?;

    Ok(Json(openings))
}

/// Build pack routes
pub fn pack_routes() -> Router<AppState> {
    Router::new()
        .route("/packs/open", post(open_pack))
        .route("/packs/recent", get(recent_openings))
}
