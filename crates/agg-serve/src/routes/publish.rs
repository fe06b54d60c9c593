use crate::middleware::correlation::CorrelationId;
use crate::routes::error::error_response;
use crate::AppState;
use agg_core::{AggregatorError, IntakeError};
use agg_events::types::EventInput;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct PublishResponse {
    pub status: &'static str,
    pub count: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/publish", post(publish))
        .with_state(state)
}

/// Accepts one event object or an array of event objects.
#[utoipa::path(
    post,
    path = "/publish",
    request_body(content = Vec<EventInput>, description = "A single event object or an array of events"),
    responses(
        (status = 200, body = PublishResponse),
        (status = 413, body = crate::routes::error::ErrorEnvelope),
        (status = 422, body = crate::routes::error::ErrorEnvelope),
        (status = 503, body = crate::routes::error::ErrorEnvelope)
    )
)]
pub(crate) async fn publish(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    body: Bytes,
) -> Response {
    let inputs = match parse_body(&body) {
        Ok(inputs) => inputs,
        Err(err) => return error_response(&AggregatorError::from(err), Some(correlation.0)),
    };
    match state.aggregator.publish(inputs).await {
        Ok(count) => Json(PublishResponse {
            status: "events queued",
            count,
        })
        .into_response(),
        Err(err) => error_response(&AggregatorError::from(err), Some(correlation.0)),
    }
}

/// Parses the body directly from bytes so raw payloads keep their exact text.
fn parse_body(body: &[u8]) -> Result<Vec<EventInput>, IntakeError> {
    let parsed = match body.iter().find(|byte| !byte.is_ascii_whitespace()) {
        Some(b'[') => serde_json::from_slice::<Vec<EventInput>>(body),
        _ => serde_json::from_slice::<EventInput>(body).map(|input| vec![input]),
    };
    parsed.map_err(|err| IntakeError::Malformed {
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_object_and_array() {
        let one = parse_body(br#" {"topic":"a","source":"s"}"#).unwrap();
        assert_eq!(one.len(), 1);

        let many = parse_body(br#"[{"topic":"a","source":"s"},{"topic":"b","source":"s"}]"#)
            .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].topic, "b");
    }

    #[test]
    fn rejects_missing_fields_and_garbage() {
        assert!(matches!(
            parse_body(br#"{"source":"s"}"#),
            Err(IntakeError::Malformed { .. })
        ));
        assert!(parse_body(b"").is_err());
        assert!(parse_body(b"[1, 2]").is_err());
        assert!(parse_body(br#"{"topic":"a","source":"s","timestamp":"yesterday"}"#).is_err());
    }
}
