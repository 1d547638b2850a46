//! Router assembly: resource routers plus the middleware stack.

use axum::http::{HeaderName, HeaderValue, Request};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api;
use crate::core::ServerState;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(api::health::router())
        .merge(api::orders::router())
        .merge(api::stock::router())
        .merge(api::catalog::router())
}

/// Build the fully configured application with all middleware.
pub fn build_app(state: ServerState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");
    build_router()
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request ID - generate and propagate a unique id per request
        .layer(SetRequestIdLayer::new(request_id_header.clone(), XRequestId))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .with_state(state)
}
