use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::dtos::CreateUserRequest;
use crate::middleware::CurrentUser;
use crate::models::permission::{ResourceKind, roles};
use crate::services::error::ServiceError;
use crate::services::scope::SearchQuery;
use crate::startup::AppState;
use service_core::error::AppError;

use super::require_any_role;

const USER_READERS: &[&str] = &[
    roles::SUPER_ADMIN,
    roles::ACCOUNT_MANAGER,
    roles::CLIENT_ADMIN,
    roles::GROUP_ADMIN,
    roles::SITE_MANAGER,
];

pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    // Who may create whom depends on the branch the request lands in.
    if !request.admin_user_type.is_empty() {
        if request.admin_user_type.eq_ignore_ascii_case(roles::GROUP_ADMIN) {
            require_any_role(&claims, &[roles::SUPER_ADMIN, roles::ACCOUNT_MANAGER])?;
        } else {
            require_any_role(
                &claims,
                &[
                    roles::SUPER_ADMIN,
                    roles::ACCOUNT_MANAGER,
                    roles::CLIENT_ADMIN,
                ],
            )?;
        }
        ensure_access(&state, &claims, ResourceKind::Client, &request.client_id).await?;
    } else if !request.site_user_type.is_empty() {
        require_any_role(&claims, USER_READERS)?;
        ensure_access(&state, &claims, ResourceKind::Site, &request.site_id).await?;
    } else {
        require_any_role(
            &claims,
            &[
                roles::SUPER_ADMIN,
                roles::ACCOUNT_MANAGER,
                roles::CLIENT_ADMIN,
            ],
        )?;
        ensure_access(&state, &claims, ResourceKind::Client, &request.client_id).await?;
    }

    let user = state.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn ensure_access(
    state: &AppState,
    claims: &crate::models::permission::Claims,
    kind: ResourceKind,
    resource_id: &str,
) -> Result<(), AppError> {
    if !state
        .evaluator
        .can_access(&claims.permissions, kind, resource_id)
        .await?
    {
        return Err(AppError::from(ServiceError::Forbidden));
    }
    Ok(())
}

pub async fn search_users(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    require_any_role(&claims, USER_READERS)?;
    let page = state.users.search_users(&claims, &query).await?;
    Ok(Json(page))
}

pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // Self-reads skip the role gate so plain site users can load their own
    // profile.
    if claims.id != user_id {
        require_any_role(&claims, USER_READERS)?;
    }
    let user = state.users.get_user(&claims, &user_id).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_any_role(&claims, USER_READERS)?;
    state.users.delete_user(&claims, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
