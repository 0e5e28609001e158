use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

/// Startup configuration failures. Each variant names the offending key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("At least one CORS origin must be configured in Cors.AllowedOrigins.")]
    NoCorsOrigins,

    #[error("CORS origins cannot be null or whitespace.")]
    BlankCorsOrigin,

    #[error("Authentication.Authority must be an absolute URI.")]
    InvalidAuthority,

    #[error("Authentication.Audience must be provided.")]
    MissingAudience,

    #[error("Authentication.ClientId must be provided.")]
    MissingClientId,

    #[error("Authentication.Scopes must contain at least one valid scope.")]
    InvalidScopes,

    #[error("Authentication.NameClaimType must be provided.")]
    MissingNameClaimType,

    #[error("Authentication.RoleClaimType must be provided.")]
    MissingRoleClaimType,

    #[error("Endpoints.ApiBaseUrl must be an absolute URI.")]
    InvalidApiBaseUrl,

    #[error("{key} must be a path starting with '/' without route parameters.")]
    InvalidCallbackPath { key: &'static str },

    #[error("{key} must not reuse a built-in route or the other callback path.")]
    ReservedCallbackPath { key: &'static str },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Auth(ref msg) => {
                tracing::debug!("Token rejected: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::ExternalServiceError(ref msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), None));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
