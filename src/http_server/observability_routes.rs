//! Observability HTTP Routes
//!
//! Health check and counters.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::errors::ApiResult;
use crate::observability::MetricsSnapshot;
use crate::students::StudentStore;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub students: usize,
}

/// Metrics response
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    pub documents: usize,
}

/// Create observability routes
pub fn observability_routes(store: Arc<StudentStore>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(store)
}

async fn health_handler(State(store): State<Arc<StudentStore>>) -> ApiResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        students: store.count()?,
    }))
}

async fn metrics_handler(State(store): State<Arc<StudentStore>>) -> ApiResult<Json<MetricsResponse>> {
    Ok(Json(MetricsResponse {
        counters: store.metrics().snapshot(),
        documents: store.count()?,
    }))
}
