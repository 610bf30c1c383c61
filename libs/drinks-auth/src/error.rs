//! Authorization failure taxonomy.

use http::StatusCode;
use thiserror::Error;

/// How a failure is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The caller could not be authenticated.
    Unauthorized,
    /// The caller is authenticated but lacks the required scope.
    Forbidden,
}

impl Classification {
    #[must_use]
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

/// Every way a protected request can be rejected by the gate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Authorization header is expected")]
    MissingHeader,

    #[error("{reason}")]
    MalformedHeader { reason: &'static str },

    #[error("Unable to parse authentication token: {reason}")]
    MalformedToken { reason: String },

    #[error("Invalid token header: {reason}")]
    InvalidHeader { reason: String },

    #[error("Unable to find the appropriate key: {kid}")]
    KeyNotFound { kid: String },

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Incorrect claims: {reason}")]
    InvalidClaims { reason: String },

    #[error("Permission not found: {scope}")]
    PermissionDenied { scope: String },

    #[error("Signing keys are unavailable: {reason}")]
    KeySetUnavailable { reason: String },
}

impl AuthFailure {
    pub fn malformed_token(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }

    pub fn invalid_header(reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            reason: reason.into(),
        }
    }

    pub fn invalid_claims(reason: impl Into<String>) -> Self {
        Self::InvalidClaims {
            reason: reason.into(),
        }
    }

    pub fn key_set_unavailable(reason: impl Into<String>) -> Self {
        Self::KeySetUnavailable {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn classification(&self) -> Classification {
        match self {
            Self::PermissionDenied { .. } => Classification::Forbidden,
            _ => Classification::Unauthorized,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.classification().status_code()
    }

    /// Stable machine-readable code, used as a log field.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "authorization_header_missing",
            Self::MalformedHeader { .. } | Self::MalformedToken { .. } | Self::InvalidHeader { .. } => {
                "invalid_header"
            }
            Self::KeyNotFound { .. } => "key_not_found",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::InvalidClaims { .. } => "invalid_claims",
            Self::PermissionDenied { .. } => "unauthorized",
            Self::KeySetUnavailable { .. } => "key_set_unavailable",
        }
    }
}
