use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::models::permission::{Claims, Status};
use crate::services::error::ServiceError;
use crate::services::token::SessionTokens;
use crate::startup::AppState;
use crate::store::AccountStore;
use service_core::error::AppError;

/// Verified identity of the caller, inserted into request extensions by the
/// auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

/// Resolve and verify the bearer token from an Authorization header value.
///
/// The token must still be the one stored on the account (logins overwrite
/// it, so an old token dies as soon as a new session opens), the account
/// must be active, and the signature must verify against the account's key.
pub async fn authenticate_bearer(
    accounts: &dyn AccountStore,
    tokens: &SessionTokens,
    header_value: Option<&str>,
) -> Result<Claims, ServiceError> {
    let raw = header_value.ok_or(ServiceError::Unauthorized)?;

    let mut parts = raw.split_whitespace();
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => return Err(ServiceError::Unauthorized),
    };
    if !scheme.eq_ignore_ascii_case("Bearer") || token.is_empty() {
        return Err(ServiceError::Unauthorized);
    }

    let account = accounts
        .find_by_token(token)
        .await?
        .ok_or(ServiceError::Unauthorized)?;

    if account.status != Status::Active {
        return Err(ServiceError::Unauthorized);
    }

    let claims = tokens.decode(token, &account.id)?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(ServiceError::TokenExpired);
    }

    Ok(claims)
}

/// Middleware that requires a valid session on every route behind it.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let claims = authenticate_bearer(state.accounts.as_ref(), &state.tokens, header_value)
        .await
        .map_err(|e| AppError::from(e).into_response())?;

    req.extensions_mut().insert(CurrentUser(claims));
    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| {
                AppError::from(ServiceError::Unauthorized).into_response()
            })
    }
}
