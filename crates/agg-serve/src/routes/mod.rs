pub mod error;
pub mod events;
pub mod health;
pub mod publish;
pub mod stats;

use crate::middleware::correlation::correlation_middleware;
use crate::{openapi, AppState};
use axum::middleware;
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(publish::router(state.clone()))
        .merge(events::router(state.clone()))
        .merge(stats::router(state.clone()))
        .merge(health::router(state))
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .route_layer(middleware::from_fn(correlation_middleware))
}
