//! HTTP error mapping.
//!
//! Every error response carries a `{"detail": ...}` body whose
//! message is user-facing pt-PT, forwarded from the domain error.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use credimo_core::error::CredimoError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<CredimoError> for ApiError {
    fn from(err: CredimoError) -> Self {
        let message = err.to_string();
        match err {
            CredimoError::NotFound { .. } => ApiError::NotFound(message),
            CredimoError::AlreadyExists { .. }
            | CredimoError::BankAuthorizationRequired { .. }
            | CredimoError::Conflict { .. } => ApiError::BadRequest(message),
            CredimoError::InvalidCredentials | CredimoError::AuthenticationFailed { .. } => {
                ApiError::Unauthorized(message)
            }
            CredimoError::AuthorizationDenied { .. } => ApiError::Forbidden(message),
            CredimoError::Validation { .. } => ApiError::Unprocessable(message),
            CredimoError::Database(_) | CredimoError::Crypto(_) | CredimoError::Internal(_) => {
                ApiError::Internal(message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let detail = match &self {
            // Internal details never reach the client.
            ApiError::Internal(message) => {
                error!(%message, "internal error");
                "Erro interno do servidor".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (
                ApiError::from(CredimoError::not_found("processo", "x")),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(CredimoError::InvalidCredentials),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::from(CredimoError::forbidden("sem acesso")),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::from(CredimoError::validation("campo em falta")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(CredimoError::BankAuthorizationRequired {
                    message: "mover para pré-aprovação".into(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(CredimoError::Database("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
