use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Application-level error carrying the `(status, code)` pair exposed to
/// callers. Services construct these through their own error enums; the
/// transport framing happens once, in `IntoResponse`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// 400 with a short machine-readable code, e.g. `invalid_data`.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 401; the message doubles as the response code (`Not Authorized`,
    /// `Token expired`).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 500 with a generic code; the underlying cause is logged, never
    /// returned to the caller.
    #[error("{code}: {source}")]
    Internal {
        code: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn internal(code: impl Into<String>, source: anyhow::Error) -> Self {
        AppError::Internal {
            code: code.into(),
            source,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::internal("io_error", anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, code, details) = match self {
            AppError::ValidationError(err) => (
                StatusCode::BAD_REQUEST,
                "invalid_data".to_string(),
                Some(err.to_string()),
            ),
            AppError::BadRequest(code) => (StatusCode::BAD_REQUEST, code, None),
            AppError::Unauthorized(code) => (StatusCode::UNAUTHORIZED, code, None),
            AppError::Forbidden(code) => (StatusCode::FORBIDDEN, code, None),
            AppError::NotFound(code) => (StatusCode::NOT_FOUND, code, None),
            AppError::Internal { code, source } => {
                tracing::error!(code = %code, error = %source, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, code, None)
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "config_error".to_string(),
                    None,
                )
            }
        };

        (status, Json(ErrorResponse { error: code, details })).into_response()
    }
}
