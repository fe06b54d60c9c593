use crate::AppState;
use agg_events::types::Event;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct EventsQuery {
    /// Only return events published on this topic. Empty means no filter.
    topic: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events", get(list_events))
        .with_state(state)
}

/// Admitted events in processing order.
#[utoipa::path(
    get,
    path = "/events",
    params(EventsQuery),
    responses((status = 200, body = Vec<Event>))
)]
pub(crate) async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<Event>> {
    let topic = query.topic.as_deref().filter(|topic| !topic.trim().is_empty());
    Json(state.aggregator.events(topic))
}
