//! Health check HTTP handler

use axum::{extract::State, response::Response};
use serde::Serialize;

use crate::web::{responses::ok, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub observers: usize,
    pub cache_ttl_seconds: u64,
}

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> Response {
    ok(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        observers: state.catalog.notifications().observer_count(),
        cache_ttl_seconds: state.config.cache.ttl_seconds,
    })
}
