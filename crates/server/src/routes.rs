use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::ResourceRegistry;

use crate::errors::ApiError;
use crate::{metrics, openapi, resources};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ResourceRegistry>,
}

impl AppState {
    pub fn new(registry: ResourceRegistry) -> Self {
        Self { registry: Arc::new(registry) }
    }
}

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse))
)]
pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

async fn fallback() -> ApiError {
    ApiError::NotFound("not found".into())
}

/// Build the full application router: operational endpoints plus the
/// generic `/:resource` CRUD routes.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let ops = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics::metrics))
        .route("/api-docs/openapi.json", get(openapi::openapi_json));

    let resource_routes = Router::new()
        .route("/:resource", get(resources::list).post(resources::create))
        .route(
            "/:resource/:id",
            get(resources::find)
                .put(resources::replace)
                .patch(resources::update)
                .delete(resources::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), metrics::track));

    ops.merge(resource_routes)
        .fallback(fallback)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                        // 5xx responses
                        .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
                )
                .layer(cors),
        )
}
