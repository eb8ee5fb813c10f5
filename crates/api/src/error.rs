// HTTP error taxonomy
// Decision: One enum for every handler; auth failures collapse into a single
// Unauthenticated variant so callers cannot tell which check failed
// Decision: Outage and bug details are logged, never sent to the client

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use vidora_storage::StorageError;

use crate::api::common::ErrorResponse;
use crate::auth::session::SessionError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{0}")]
    ValidationFailed(String),

    /// Duplicate identity
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Authenticated, but not the owner of the resource
    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid user credentials")]
    InvalidCredential,

    /// Missing, invalid, expired or replayed token
    #[error("Unauthorized request")]
    Unauthenticated,

    /// Downstream store or service failure; retryable
    #[error("Service temporarily unavailable")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationFailed(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidCredential | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(field) => {
                ApiError::Conflict(format!("User with this {} already exists", field))
            }
            StorageError::Unavailable(detail) => ApiError::Unavailable(detail),
            StorageError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => ApiError::not_found("User does not exist"),
            SessionError::InvalidCredential => ApiError::InvalidCredential,
            SessionError::Unauthenticated
            | SessionError::InvalidToken
            | SessionError::TokenReuseDetected => ApiError::Unauthenticated,
            SessionError::Storage(e) => e.into(),
            SessionError::Token(e) => ApiError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Unavailable(detail) => {
                tracing::warn!(detail = %detail, "Request failed: dependency unavailable");
            }
            ApiError::Internal(e) => {
                tracing::error!(error = ?e, "Request failed: internal error");
            }
            _ => {}
        }

        (status, Json(ErrorResponse::new(status, self.to_string()))).into_response()
    }
}
