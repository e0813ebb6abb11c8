// src/handlers/healthcheck.rs

use axum::response::IntoResponse;

use crate::utils::response::ApiResponse;

/// Liveness probe; touches nothing.
pub async fn healthcheck() -> impl IntoResponse {
    ApiResponse::ok("OK", "Health check passed")
}
