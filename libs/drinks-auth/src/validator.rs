//! Signature and claims validation.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::Algorithm;

use crate::decoder::DecodedToken;
use crate::error::AuthFailure;
use crate::key_set::{SigningKey, SigningKeySet};
use crate::principal::VerifiedPrincipal;

/// Checks a decoded token against a key set and the expected issuer/audience.
///
/// Check order: header (`alg`, `kid`), expiry, key lookup, signature, then the
/// remaining claims. Expiry is decided before the signature so an expired
/// token is always reported as expired.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    algorithm: Algorithm,
    issuer: String,
    audience: String,
}

impl TokenValidator {
    /// Validator accepting RS256 only.
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            algorithm: Algorithm::RS256,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// Replace the single accepted algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Checks that need no key material. Returns the token's `kid`.
    ///
    /// # Errors
    /// [`AuthFailure::InvalidHeader`] for a wrong `alg` or missing `kid`,
    /// [`AuthFailure::TokenExpired`] / [`AuthFailure::InvalidClaims`] for `exp`.
    pub fn precheck_at<'t>(
        &self,
        decoded: &'t DecodedToken,
        now: i64,
    ) -> Result<&'t str, AuthFailure> {
        let header = decoded.header();
        let Some(alg) = header.alg.as_deref() else {
            return Err(AuthFailure::invalid_header("alg is required"));
        };
        if Algorithm::from_str(alg).ok() != Some(self.algorithm) {
            return Err(AuthFailure::invalid_header(format!(
                "unsupported algorithm '{alg}'"
            )));
        }
        let kid = match header.kid.as_deref() {
            Some(kid) if !kid.is_empty() => kid,
            _ => return Err(AuthFailure::invalid_header("Authorization malformed.")),
        };

        match decoded.claims().exp {
            None => return Err(AuthFailure::invalid_claims("exp is required")),
            Some(exp) if exp <= now => return Err(AuthFailure::TokenExpired),
            Some(_) => {}
        }

        Ok(kid)
    }

    /// Validate against the current wall clock.
    ///
    /// # Errors
    /// See [`TokenValidator::validate_at`].
    pub fn validate(
        &self,
        decoded: &DecodedToken,
        keys: &SigningKeySet,
    ) -> Result<VerifiedPrincipal, AuthFailure> {
        self.validate_at(decoded, keys, chrono::Utc::now().timestamp())
    }

    /// Validate with an explicit `now` (seconds since the epoch).
    ///
    /// # Errors
    /// Returns the first failing check: `InvalidHeader`, `TokenExpired`,
    /// `KeyNotFound`, `InvalidSignature` or `InvalidClaims`.
    pub fn validate_at(
        &self,
        decoded: &DecodedToken,
        keys: &SigningKeySet,
        now: i64,
    ) -> Result<VerifiedPrincipal, AuthFailure> {
        let kid = self.precheck_at(decoded, now)?;

        let key = keys.find(kid).ok_or_else(|| AuthFailure::KeyNotFound {
            kid: kid.to_owned(),
        })?;
        if key.algorithm != self.algorithm {
            return Err(AuthFailure::invalid_header(format!(
                "key '{kid}' is registered for a different algorithm"
            )));
        }

        verify_signature(decoded, key)?;

        let claims = decoded.claims();
        if let Some(nbf) = claims.nbf
            && nbf > now
        {
            return Err(AuthFailure::invalid_claims("token is not yet valid"));
        }
        if claims.iss.as_deref() != Some(self.issuer.as_str()) {
            return Err(AuthFailure::invalid_claims(
                "incorrect claims, please check the audience and issuer",
            ));
        }
        if !claims.aud.as_ref().is_some_and(|aud| aud.contains(&self.audience)) {
            return Err(AuthFailure::invalid_claims(
                "incorrect claims, please check the audience and issuer",
            ));
        }
        let subject = match claims.sub.as_deref() {
            Some(sub) if !sub.is_empty() => sub.to_owned(),
            _ => return Err(AuthFailure::invalid_claims("sub is required")),
        };

        Ok(VerifiedPrincipal::new(
            subject,
            claims.permissions.clone().unwrap_or_default(),
        ))
    }
}

fn verify_signature(decoded: &DecodedToken, key: &SigningKey) -> Result<(), AuthFailure> {
    let decoding_key = key.decoding_key().map_err(|err| {
        tracing::warn!(kid = %key.key_id, error = %err, "signing key cannot be rebuilt");
        AuthFailure::InvalidSignature
    })?;
    let signature = URL_SAFE_NO_PAD.encode(decoded.signature());

    match jsonwebtoken::crypto::verify(
        &signature,
        decoded.signing_input(),
        &decoding_key,
        key.algorithm,
    ) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthFailure::InvalidSignature),
        Err(err) => {
            tracing::debug!(kid = %key.key_id, error = %err, "signature verification errored");
            Err(AuthFailure::InvalidSignature)
        }
    }
}
