use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::key_set::is_rsa;

fn default_algorithm() -> String {
    "RS256".to_owned()
}

fn default_key_set_ttl_secs() -> u64 {
    300
}

fn default_fetch_timeout_ms() -> u64 {
    5_000
}

/// Identity provider settings for token verification.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Tenant domain, e.g. `drinks.eu.auth0.com`. When set, `jwks_url` and
    /// `issuer` default to `https://{domain}/.well-known/jwks.json` and
    /// `https://{domain}/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default)]
    pub jwks_url: String,

    #[serde(default)]
    pub issuer: String,

    #[serde(default)]
    pub audience: String,

    /// The single accepted signing algorithm.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Key set lifetime; `0` fetches on every verification.
    #[serde(default = "default_key_set_ttl_secs")]
    pub key_set_ttl_secs: u64,

    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            domain: None,
            jwks_url: String::new(),
            issuer: String::new(),
            audience: String::new(),
            algorithm: default_algorithm(),
            key_set_ttl_secs: default_key_set_ttl_secs(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("auth.{0} must be set")]
    Missing(&'static str),

    #[error("auth.jwks_url is not a valid http(s) url: {0}")]
    InvalidUrl(String),

    #[error("auth.algorithm '{0}' is not an RSA signature algorithm")]
    UnsupportedAlgorithm(String),

    #[error("auth.fetch_timeout_ms must be greater than zero")]
    ZeroTimeout,
}

impl AuthConfig {
    /// Effective JWKS endpoint, derived from `domain` when not set explicitly.
    #[must_use]
    pub fn resolved_jwks_url(&self) -> Option<String> {
        if !self.jwks_url.is_empty() {
            return Some(self.jwks_url.clone());
        }
        self.domain
            .as_deref()
            .map(|d| format!("https://{}/.well-known/jwks.json", d.trim_end_matches('/')))
    }

    /// Effective issuer, derived from `domain` when not set explicitly.
    #[must_use]
    pub fn resolved_issuer(&self) -> Option<String> {
        if !self.issuer.is_empty() {
            return Some(self.issuer.clone());
        }
        self.domain
            .as_deref()
            .map(|d| format!("https://{}/", d.trim_end_matches('/')))
    }

    /// # Errors
    /// Returns [`ConfigError::UnsupportedAlgorithm`] for unknown or non-RSA algorithms.
    pub fn parsed_algorithm(&self) -> Result<Algorithm, ConfigError> {
        match Algorithm::from_str(&self.algorithm) {
            Ok(alg) if is_rsa(alg) => Ok(alg),
            _ => Err(ConfigError::UnsupportedAlgorithm(self.algorithm.clone())),
        }
    }

    #[must_use]
    pub fn key_set_ttl(&self) -> Duration {
        Duration::from_secs(self.key_set_ttl_secs)
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Check the settings the gate cannot run without.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let jwks_url = self
            .resolved_jwks_url()
            .ok_or(ConfigError::Missing("jwks_url"))?;
        let parsed =
            url::Url::parse(&jwks_url).map_err(|e| ConfigError::InvalidUrl(format!("{jwks_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(jwks_url));
        }
        if self.resolved_issuer().is_none() {
            return Err(ConfigError::Missing("issuer"));
        }
        if self.audience.is_empty() {
            return Err(ConfigError::Missing("audience"));
        }
        self.parsed_algorithm()?;
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}
