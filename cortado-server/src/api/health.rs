//! Health check route.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Server instance id, changes on every restart.
    epoch: String,
    environment: String,
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        epoch: state.orders.epoch().to_string(),
        environment: state.config.environment.clone(),
    })
}
