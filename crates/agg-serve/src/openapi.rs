use crate::routes::error::ErrorEnvelope;
use crate::routes::events::EventsQuery;
use crate::routes::health::HealthResponse;
use crate::routes::publish::PublishResponse;
use crate::routes::stats::StatsResponse;
use agg_events::types::{Event, EventInput, IdentityKey};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Event Aggregator Service"),
    paths(
        crate::routes::publish::publish,
        crate::routes::events::list_events,
        crate::routes::stats::get_stats,
        crate::routes::health::health
    ),
    components(schemas(
        Event,
        EventInput,
        IdentityKey,
        EventsQuery,
        PublishResponse,
        StatsResponse,
        HealthResponse,
        ErrorEnvelope
    ))
)]
struct ApiDoc;

pub fn generate_spec() -> String {
    ApiDoc::openapi()
        .to_pretty_json()
        .unwrap_or_else(|_| "{}".to_string())
}

pub fn router() -> Router {
    Router::new()
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(swagger_ui))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

async fn swagger_ui() -> impl IntoResponse {
    let html = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>Event Aggregator API</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
  </head>
  <body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
      window.ui = SwaggerUIBundle({ url: '/openapi.json', dom_id: '#swagger-ui' });
    </script>
  </body>
</html>
"#;
    axum::response::Html(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_every_route() {
        let document = generate_spec();
        for path in ["/publish", "/events", "/stats", "/health"] {
            assert!(document.contains(&format!("\"{path}\"")), "missing {path}");
        }
    }
}
