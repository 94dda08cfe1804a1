use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Liveness probe - process is running.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Process is alive", body = LivenessResponse))
)]
pub async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(LivenessResponse { status: "alive" }))
}
