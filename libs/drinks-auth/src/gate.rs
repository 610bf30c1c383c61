//! The single choke point every protected operation goes through.

use std::sync::Arc;

use crate::config::{AuthConfig, ConfigError};
use crate::decoder::{DecodedToken, decode};
use crate::enforcer::enforce;
use crate::error::AuthFailure;
use crate::key_cache::KeySetCache;
use crate::key_source::{HttpKeySetSource, KeySetSource};
use crate::principal::VerifiedPrincipal;
use crate::validator::TokenValidator;

/// Extraction, decoding, validation and scope enforcement in one call.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    keys: Arc<KeySetCache>,
    validator: TokenValidator,
}

impl AuthorizationGate {
    #[must_use]
    pub fn new(keys: Arc<KeySetCache>, validator: TokenValidator) -> Self {
        Self { keys, validator }
    }

    /// Build a gate backed by the configured JWKS endpoint.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the configuration is incomplete or the HTTP
    /// client cannot be built.
    pub fn from_config(cfg: &AuthConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let jwks_url = cfg
            .resolved_jwks_url()
            .ok_or(ConfigError::Missing("jwks_url"))?;
        let issuer = cfg.resolved_issuer().ok_or(ConfigError::Missing("issuer"))?;

        let source = HttpKeySetSource::new(&jwks_url)
            .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        tracing::info!(
            jwks_url = %jwks_url,
            issuer = %issuer,
            audience = %cfg.audience,
            ttl_secs = cfg.key_set_ttl_secs,
            "token verification configured"
        );

        Ok(Self::from_source(
            Arc::new(source),
            cfg,
            TokenValidator::new(issuer, cfg.audience.clone()).with_algorithm(cfg.parsed_algorithm()?),
        ))
    }

    /// Build a gate over any key source using the cache settings of `cfg`.
    #[must_use]
    pub fn from_source(
        source: Arc<dyn KeySetSource>,
        cfg: &AuthConfig,
        validator: TokenValidator,
    ) -> Self {
        let cache = KeySetCache::new(source, cfg.key_set_ttl(), cfg.fetch_timeout());
        Self::new(Arc::new(cache), validator)
    }

    #[must_use]
    pub fn key_cache(&self) -> &Arc<KeySetCache> {
        &self.keys
    }

    /// Authorize a request given its raw `Authorization` header value.
    ///
    /// # Errors
    /// Returns the [`AuthFailure`] of the first failing step.
    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        required_scope: &str,
    ) -> Result<VerifiedPrincipal, AuthFailure> {
        let result = self.run(authorization, required_scope).await;
        match &result {
            Ok(principal) => tracing::debug!(
                subject = %principal.subject(),
                scope = required_scope,
                "request authorized"
            ),
            Err(err) => log_auth_failure(err, required_scope),
        }
        result
    }

    async fn run(
        &self,
        authorization: Option<&str>,
        required_scope: &str,
    ) -> Result<VerifiedPrincipal, AuthFailure> {
        let raw = extract_bearer_token(authorization)?;
        let decoded = decode(raw)?;
        let principal = self.verify(&decoded).await?;
        enforce(principal, required_scope)
    }

    async fn verify(&self, decoded: &DecodedToken) -> Result<VerifiedPrincipal, AuthFailure> {
        // Rejects bad headers and expired tokens without touching the key set.
        self.validator
            .precheck_at(decoded, chrono::Utc::now().timestamp())?;

        let snapshot = self.keys.get().await?;
        match self.validator.validate(decoded, &snapshot.keys) {
            Err(AuthFailure::KeyNotFound { kid }) => {
                tracing::debug!(kid = %kid, generation = snapshot.generation, "unknown kid, refreshing key set");
                let refreshed = self.keys.refresh_after(Some(snapshot.generation)).await?;
                self.validator.validate(decoded, &refreshed.keys)
            }
            other => other,
        }
    }
}

/// Pull the token out of `Bearer <token>`.
///
/// The scheme is matched case-insensitively; anything other than exactly two
/// whitespace-separated parts is malformed.
///
/// # Errors
/// [`AuthFailure::MissingHeader`] when absent, [`AuthFailure::MalformedHeader`]
/// otherwise.
pub fn extract_bearer_token(authorization: Option<&str>) -> Result<&str, AuthFailure> {
    let value = authorization.ok_or(AuthFailure::MissingHeader)?;
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), _, _) if !scheme.eq_ignore_ascii_case("bearer") => {
            Err(AuthFailure::MalformedHeader {
                reason: "Authorization header must start with \"Bearer\".",
            })
        }
        (Some(_), Some(token), None) => Ok(token),
        (Some(_), None, _) => Err(AuthFailure::MalformedHeader {
            reason: "Token not found.",
        }),
        _ => Err(AuthFailure::MalformedHeader {
            reason: "Authorization header must be bearer token.",
        }),
    }
}

fn log_auth_failure(err: &AuthFailure, scope: &str) {
    match err {
        AuthFailure::KeySetUnavailable { .. } => {
            tracing::error!(code = err.code(), scope, "authorization failed: {err}");
        }
        AuthFailure::PermissionDenied { .. } => {
            tracing::info!(code = err.code(), scope, "authorization denied: {err}");
        }
        _ => tracing::debug!(code = err.code(), scope, "authorization rejected: {err}"),
    }
}
