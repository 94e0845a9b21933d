use service_core::error::AppError;
use thiserror::Error;

/// Errors produced by the admin services. Every variant maps to exactly one
/// `(status, code)` pair on the wire; callers match on codes, not messages.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    /// A write against `{0}` failed mid-flow; surfaces as `{0}_error`.
    #[error("Update failed for {0}")]
    UpdateError(&'static str),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Account is not active")]
    AccountNotActive,

    #[error("Not authorized")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid resource id: {0}")]
    InvalidResource(String),

    #[error("Limit reached: {0}")]
    LimitReached(&'static str),

    #[error("Account already exists: {0}")]
    DuplicateAccount(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => {
                AppError::internal("database_error".to_string(), anyhow::Error::new(e))
            }
            ServiceError::Internal(e) => AppError::internal("internal_error".to_string(), e),
            ServiceError::UpdateError(target) => AppError::internal(
                format!("{target}_error"),
                anyhow::anyhow!("update failed for {target}"),
            ),
            ServiceError::InvalidCredentials => {
                AppError::BadRequest("invalid_credentials".to_string())
            }
            ServiceError::InvalidPassword => AppError::BadRequest("invalid_password".to_string()),
            ServiceError::AccountNotActive => {
                AppError::BadRequest("account_not_active".to_string())
            }
            ServiceError::Unauthorized => AppError::Unauthorized("Not Authorized".to_string()),
            ServiceError::TokenExpired => AppError::Unauthorized("Token expired".to_string()),
            ServiceError::Forbidden => AppError::Forbidden("forbidden".to_string()),
            ServiceError::NotFound => AppError::NotFound("not_found".to_string()),
            ServiceError::BadRequest(_) => AppError::BadRequest("bad_request".to_string()),
            ServiceError::InvalidData(_) => AppError::BadRequest("invalid_data".to_string()),
            ServiceError::InvalidResource(_) => {
                AppError::BadRequest("invalid_resource".to_string())
            }
            ServiceError::LimitReached(_) => AppError::BadRequest("invalid_data".to_string()),
            ServiceError::DuplicateAccount(_) => {
                AppError::BadRequest("duplicate_user".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn auth_errors_are_401() {
        assert_eq!(status_of(ServiceError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ServiceError::TokenExpired), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn domain_errors_are_400() {
        assert_eq!(
            status_of(ServiceError::InvalidCredentials),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::DuplicateAccount("a@b.c".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::InvalidResource("xyz".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn update_errors_are_500() {
        assert_eq!(
            status_of(ServiceError::UpdateError("update_user")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
