use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::dtos::{
    ChangePasswordRequest, ConfirmAccountRequest, ForgotPasswordRequest, LoginRequest,
};
use crate::middleware::CurrentUser;
use crate::startup::AppState;
use service_core::error::AppError;

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let response = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(response))
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    state.auth.logout(&claims.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    // Only the account holder may rotate their own password.
    if !claims.email.eq_ignore_ascii_case(&request.email) {
        return Err(AppError::Forbidden("forbidden".to_string()));
    }
    state
        .auth
        .change_password(&request.email, &request.old_password, &request.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    state.auth.forgot_password(&request.email).await?;
    Ok(Json(json!({ "status": "ok" })))
}

pub async fn confirm_account(
    State(state): State<AppState>,
    Json(request): Json<ConfirmAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let user = state.auth.confirm_account(request).await?;
    Ok(Json(user))
}
