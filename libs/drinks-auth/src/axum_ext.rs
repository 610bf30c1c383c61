//! Axum glue: JSON error envelope and header-based authorization.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, HeaderValue, StatusCode, header};
use serde::{Deserialize, Serialize};

use crate::error::AuthFailure;
use crate::gate::AuthorizationGate;
use crate::principal::VerifiedPrincipal;

/// Body of every error response: `{"success": false, "error": <status>, "message": <text>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: u16,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: status.as_u16(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for AuthFailure {
    fn into_response(self) -> Response {
        let status = self.status_code();
        ErrorEnvelope::new(status, self.to_string()).into_response_with(status)
    }
}

impl AuthorizationGate {
    /// Authorize using the request's `Authorization` header.
    ///
    /// # Errors
    /// As [`AuthorizationGate::authorize`]; a header that is not visible ASCII
    /// is [`AuthFailure::MalformedHeader`].
    pub async fn authorize_headers(
        &self,
        headers: &HeaderMap,
        required_scope: &str,
    ) -> Result<VerifiedPrincipal, AuthFailure> {
        let value = headers
            .get(header::AUTHORIZATION)
            .map(HeaderValue::to_str)
            .transpose()
            .map_err(|_| AuthFailure::MalformedHeader {
                reason: "Authorization header must be bearer token.",
            })?;
        self.authorize(value, required_scope).await
    }
}
