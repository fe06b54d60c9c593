use crate::AppState;
use agg_core::StatsSnapshot;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

/// Counters are eventually consistent: right after a publish, `received`
/// may run ahead of `unique_processed + duplicate_dropped`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub received: u64,
    pub unique_processed: u64,
    pub duplicate_dropped: u64,
    pub store_failures: u64,
    pub topics: Vec<String>,
    pub uptime_seconds: f64,
}

impl From<StatsSnapshot> for StatsResponse {
    fn from(snapshot: StatsSnapshot) -> Self {
        Self {
            received: snapshot.received,
            unique_processed: snapshot.admitted,
            duplicate_dropped: snapshot.duplicates,
            store_failures: snapshot.store_failures,
            topics: snapshot.topics,
            uptime_seconds: snapshot.uptime_seconds,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/stats", get(get_stats))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/stats",
    responses((status = 200, body = StatsResponse))
)]
pub(crate) async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.aggregator.stats().into())
}
