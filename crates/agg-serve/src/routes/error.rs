use agg_core::{AggregatorError, IntakeError, StoreError};
use agg_events::queue::EnqueueError;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub code: &'static str,
    pub message: String,
    pub correlation_id: Option<String>,
}

pub fn map_error(
    err: &AggregatorError,
    correlation_id: Option<String>,
) -> (StatusCode, Json<ErrorEnvelope>) {
    let (status, code, message) = match err {
        AggregatorError::Intake(intake) => map_intake_error(intake),
        AggregatorError::Store(store) => map_store_error(store),
        AggregatorError::Internal { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            message.clone(),
        ),
    };

    (
        status,
        Json(ErrorEnvelope {
            code,
            message,
            correlation_id,
        }),
    )
}

/// Like [`map_error`], with a `Retry-After` hint on retryable rejections.
pub fn error_response(err: &AggregatorError, correlation_id: Option<String>) -> Response {
    let retryable = matches!(
        err,
        AggregatorError::Intake(IntakeError::Enqueue(EnqueueError::Full))
    );
    let mut response = map_error(err, correlation_id).into_response();
    if retryable {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from_static("1"));
    }
    response
}

fn map_intake_error(err: &IntakeError) -> (StatusCode, &'static str, String) {
    match err {
        IntakeError::Malformed { .. } | IntakeError::Invalid { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_input",
            err.to_string(),
        ),
        IntakeError::Enqueue(EnqueueError::Full) => {
            (StatusCode::SERVICE_UNAVAILABLE, "queue_full", err.to_string())
        }
        IntakeError::Enqueue(EnqueueError::BatchTooLarge { .. }) => (
            StatusCode::PAYLOAD_TOO_LARGE,
            "batch_too_large",
            err.to_string(),
        ),
        IntakeError::Enqueue(EnqueueError::Closed) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "shutting_down",
            err.to_string(),
        ),
    }
}

fn map_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::Unavailable { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "store_unavailable",
            err.to_string(),
        ),
    }
}
