//! Account registration and balance endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use tmk_common::time;

use crate::db::accounts::{self, Account};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub uid: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub starting_balance: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateAccountResponse {
    pub uid: String,
    /// False when the uid was already registered.
    pub created: bool,
}

/// POST /accounts
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> ApiResult<Json<CreateAccountResponse>> {
    if request.uid.trim().is_empty() {
        return Err(ApiError::BadRequest("uid is required".to_string()));
    }
    if request.starting_balance < 0 {
        return Err(ApiError::BadRequest(
            "starting_balance cannot be negative".to_string(),
        ));
    }

    let created = accounts::create_account(
        &state.db,
        &request.uid,
        &request.display_name,
        request.starting_balance,
        time::now(),
    )
    .await?;

    Ok(Json(CreateAccountResponse {
        uid: request.uid,
        created,
    }))
}

/// GET /accounts/:uid
pub async fn get_account(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Account>> {
    let account = accounts::get_account(&state.db, &uid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Account {} not found", uid)))?;

    Ok(Json(account))
}

#[derive(Debug, Deserialize)]
pub struct CreditRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct CreditResponse {
    pub uid: String,
    pub banana_balance: i64,
}

/// POST /accounts/:uid/credit
pub async fn credit_account(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(request): Json<CreditRequest>,
) -> ApiResult<Json<CreditResponse>> {
    if request.amount <= 0 {
        return Err(ApiError::BadRequest("amount must be positive".to_string()));
    }

    if !accounts::credit(&state.db, &uid, request.amount).await? {
        return Err(ApiError::NotFound(format!("Account {} not found", uid)));
    }

    let account = accounts::get_account(&state.db, &uid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Account {} not found", uid)))?;

    Ok(Json(CreditResponse {
        uid,
        banana_balance: account.banana_balance,
    }))
}

/// Build account routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts/:uid", get(get_account))
        .route("/accounts/:uid/credit", post(credit_account))
}
