use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::dtos::CreateClientRequest;
use crate::middleware::CurrentUser;
use crate::models::permission::roles;
use crate::services::scope::SearchQuery;
use crate::startup::AppState;
use service_core::error::AppError;

use super::require_any_role;

const CLIENT_READERS: &[&str] = &[
    roles::SUPER_ADMIN,
    roles::ACCOUNT_MANAGER,
    roles::CLIENT_ADMIN,
];
const CLIENT_MANAGERS: &[&str] = &[roles::SUPER_ADMIN, roles::ACCOUNT_MANAGER];

pub async fn create_client(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(request): Json<CreateClientRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_any_role(&claims, &[roles::SUPER_ADMIN])?;
    request.validate()?;
    let client = state.clients.create_client(request).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get_client(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(client_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_any_role(&claims, CLIENT_READERS)?;
    let client = state.clients.get_client(&claims, &client_id).await?;
    Ok(Json(client))
}

pub async fn search_clients(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    require_any_role(&claims, CLIENT_READERS)?;
    let page = state.clients.search_clients(&claims, &query).await?;
    Ok(Json(page))
}

pub async fn archive_client(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(client_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_any_role(&claims, CLIENT_MANAGERS)?;
    state.clients.archive_client(&client_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_client(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(client_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_any_role(&claims, CLIENT_MANAGERS)?;
    state.clients.delete_client(&client_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
