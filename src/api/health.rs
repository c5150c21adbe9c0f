//! Health check endpoint.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub templates: usize,
    pub snapshots: u64,
    pub last_snapshot_at: Option<DateTime<Utc>>,
    /// Redis hash the templates are loaded from
    pub source: String,
}

/// GET /health - 503 until the first template snapshot has been applied
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let stats = state.templates.stats();

    let (status_code, status) = if stats.ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "loading")
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            templates: stats.templates,
            snapshots: stats.snapshots,
            last_snapshot_at: stats.last_snapshot_at,
            source: state.settings.redis.templates_key.clone(),
        }),
    )
}
