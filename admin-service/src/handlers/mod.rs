pub mod auth;
pub mod clients;
pub mod users;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::models::permission::Claims;
use crate::services::error::ServiceError;
use crate::startup::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.health.check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "admin-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "admin-service",
                "error": e.to_string()
            })),
        ),
    }
}

/// Route-level role gate: the caller must hold at least one of the given
/// role tags.
pub fn require_any_role(claims: &Claims, tags: &[&str]) -> Result<(), ServiceError> {
    let allowed = claims
        .permissions
        .iter()
        .any(|p| tags.iter().any(|t| p.role.is(t)));
    if allowed {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}
