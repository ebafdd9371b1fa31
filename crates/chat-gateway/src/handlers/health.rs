use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::services::Gateway;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
}

pub async fn readiness_check(
    State(gateway): State<Arc<Gateway>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    match gateway.ready().await {
        Ok(()) => (StatusCode::OK, Json(ReadinessResponse { status: "ready" })),
        Err(e) => {
            warn!("Readiness check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "unavailable",
                }),
            )
        }
    }
}
