pub mod api;
mod middleware;

pub use api::ApiState;
pub use middleware::{REQUEST_ID_HEADER, RequestContext};

use axum::{
    Router,
    http::{Method, header},
    middleware as axum_middleware,
};
use tower_http::cors::{Any, CorsLayer};

/// Full application router: API routes wrapped in request id, logging,
/// CORS and panic recovery layers.
pub fn build_router(state: ApiState) -> Router {
    api::build_api_router(state)
        .layer(axum_middleware::from_fn(middleware::recover_panics))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
        .layer(build_cors_layer())
}

/// Any origin may call the API; credentials are never allowed.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
