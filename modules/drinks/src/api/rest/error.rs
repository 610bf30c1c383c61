use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::response::{IntoResponse, Response};
use drinks_auth::{AuthFailure, ErrorEnvelope};
use http::StatusCode;
use thiserror::Error;

use crate::domain::error::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Everything a drinks handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unprocessable: {0}")]
    Unprocessable(String),

    #[error("resource not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::UNPROCESSABLE_ENTITY {
            Self::Unprocessable(rejection.body_text())
        } else {
            Self::BadRequest(rejection.body_text())
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "path did not match a drink id");
        Self::NotFound
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Auth(failure) => (failure.status_code(), failure.to_string()),
            Self::Domain(DomainError::NotFound { .. }) | Self::NotFound => {
                (StatusCode::NOT_FOUND, "resource not found".to_owned())
            }
            Self::Domain(DomainError::Validation { .. } | DomainError::Conflict { .. })
            | Self::Unprocessable(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unprocessable".to_owned(),
            ),
            Self::Domain(DomainError::Internal(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_owned(),
            ),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad request".to_owned()),
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method not allowed".to_owned(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Auth(failure) = self {
            return failure.into_response();
        }
        let (status, message) = self.status_and_message();
        if let Self::Domain(DomainError::Internal(detail)) = &self {
            tracing::error!(error = %detail, "drinks request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "drinks request rejected");
        }
        ErrorEnvelope::new(status, message).into_response_with(status)
    }
}
