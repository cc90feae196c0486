//! Voucher inventory, redemption, and sweep endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::vouchers::{self, Voucher};
use crate::error::ApiResult;
use crate::services::voucher_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub voucher_id: Uuid,
    pub uid: String,
}

/// POST /vouchers/redeem
pub async fn redeem_voucher(
    State(state): State<AppState>,
    Json(request): Json<RedeemRequest>,
) -> ApiResult<Json<Voucher>> {
    let voucher =
        voucher_service::redeem_voucher(&state.db, request.voucher_id, &request.uid).await?;

    Ok(Json(voucher))
}

#[derive(Debug, Deserialize)]
pub struct SweepRequest {
    pub uid: String,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub removed: u64,
}

/// POST /vouchers/sweep
pub async fn sweep_expired(
    State(state): State<AppState>,
    Json(request): Json<SweepRequest>,
) -> ApiResult<Json<SweepResponse>> {
    let removed = voucher_service::sweep_expired(&state.db, &request.uid).await?;

    Ok(Json(SweepResponse { removed }))
}

/// GET /vouchers/:uid
pub async fn list_vouchers(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Vec<Voucher>>> {
    let listed = vouchers::list_for_owner(&state.db, &uid).await?;

    Ok(Json(listed))
}

/// Build voucher routes
pub fn voucher_routes() -> Router<AppState> {
    Router::new()
        .route("/vouchers/redeem", post(redeem_voucher))
        .route("/vouchers/sweep", post(sweep_expired))
        .route("/vouchers/:uid", get(list_vouchers))
}
