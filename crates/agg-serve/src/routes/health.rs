use crate::AppState;
use agg_core::WorkerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub worker: &'static str,
    pub queue_depth: usize,
    pub queue_capacity: usize,
    pub dedup_keys: Option<u64>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

/// 503 when the worker is not running or the dedup store cannot be read.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, body = HealthResponse),
        (status = 503, body = HealthResponse)
    )
)]
pub(crate) async fn health(State(state): State<AppState>) -> Response {
    let aggregator = &state.aggregator;
    let worker = aggregator.worker_state();
    let dedup_keys = match aggregator.dedup_key_count().await {
        Ok(count) => Some(count),
        Err(err) => {
            warn!(error = %err, "health check could not read dedup store");
            None
        }
    };
    let healthy = worker == WorkerState::Running && dedup_keys.is_some();
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        worker: worker.as_str(),
        queue_depth: aggregator.queue_depth(),
        queue_capacity: aggregator.queue_capacity(),
        dedup_keys,
    };
    (status, Json(body)).into_response()
}
