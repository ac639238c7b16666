use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Process liveness only; no dependency checks.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness: the scratch directory must be usable before jobs can run.
/// Buckets are request-scoped, so there is no ambient store location to
/// probe here.
pub async fn ready(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let scratch_dir = &state.config().pipeline.scratch_dir;
    match tokio::fs::create_dir_all(scratch_dir).await {
        Ok(()) => Ok(Json(HealthResponse {
            status: "ok".to_string(),
        })),
        Err(_) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable".to_string(),
            }),
        )),
    }
}

pub async fn metrics() -> String {
    encode_metrics()
}
