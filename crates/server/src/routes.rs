use std::sync::Arc;

use axum::{routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;
use service::RackStore;

use crate::metrics;
use crate::openapi::ApiDoc;

pub mod racks;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RackStore>,
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics_text() -> (axum::http::StatusCode, String) {
    metrics::encode_metrics()
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .route("/api-docs/openapi.json", get(openapi_json));

    let api = Router::new()
        .route("/api/layout", get(racks::layout))
        .route("/api/racks", get(racks::view))
        .route("/api/racks/:rack/:position", get(racks::get_record).put(racks::put_record))
        .route("/api/search", get(racks::search));

    public
        .merge(api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
