//! Health HTTP Routes
//!
//! Service banner and store connectivity check.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::storage::StorageGateway;

/// Root banner response
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}

/// `GET /` and `GET /health`
pub fn health_routes(store: Arc<dyn StorageGateway>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(store)
}

async fn root_handler() -> impl IntoResponse {
    Json(RootResponse {
        message: "omstore record service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// 200 when the store answers a ping, 503 otherwise
async fn health_handler(State(store): State<Arc<dyn StorageGateway>>) -> impl IntoResponse {
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                store: "connected".to_string(),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    store: "disconnected".to_string(),
                }),
            )
        }
    }
}
