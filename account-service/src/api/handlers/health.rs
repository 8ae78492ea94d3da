use crate::AppState;
use axum::{extract::State, http::StatusCode};

/// Liveness check. Reports unavailable when the database cannot answer a trivial query.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    summary = "Liveness check",
    responses(
        (status = 200, description = "Service and database reachable"),
        (status = 503, description = "Database unreachable")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn healthz(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(state.service.db().pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
