//! tmk-svc library interface
//!
//! Exposes the service internals for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod gacha;
pub mod services;
pub mod validators;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::anthropic_client::TextGenerator;
use crate::services::notifier::Notifier;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Text-generation collaborator
    pub textgen: Arc<dyn TextGenerator>,
    /// Completion-notification collaborator
    pub notifier: Arc<dyn Notifier>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, textgen: Arc<dyn TextGenerator>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            textgen,
            notifier,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::account_routes())
        .merge(api::question_routes())
        .merge(api::pack_routes())
        .merge(api::voucher_routes())
        .merge(api::mission_routes())
        .merge(api::report_routes())
        .with_state(state)
}
