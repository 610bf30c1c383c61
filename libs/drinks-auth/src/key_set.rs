//! Signing key material published by the identity provider.

use std::collections::HashSet;
use std::str::FromStr;

use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;

use crate::key_source::KeySetError;

/// Public key components needed to rebuild a verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyComponents {
    /// Base64url-encoded RSA modulus and exponent.
    Rsa { n: String, e: String },
}

/// One entry of a signing key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    pub key_id: String,
    pub algorithm: Algorithm,
    pub components: KeyComponents,
}

impl SigningKey {
    /// RSA key with the given base64url modulus and exponent.
    pub fn rsa(
        key_id: impl Into<String>,
        algorithm: Algorithm,
        n: impl Into<String>,
        e: impl Into<String>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            algorithm,
            components: KeyComponents::Rsa {
                n: n.into(),
                e: e.into(),
            },
        }
    }

    /// Rebuild the verification key from the stored components.
    ///
    /// # Errors
    /// Returns an error if the components are not valid base64url.
    pub fn decoding_key(&self) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
        match &self.components {
            KeyComponents::Rsa { n, e } => DecodingKey::from_rsa_components(n, e),
        }
    }
}

/// Ordered collection of signing keys with unique key ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKeySet {
    keys: Vec<SigningKey>,
}

impl SigningKeySet {
    /// Build a set, rejecting empty input and duplicate key ids.
    ///
    /// # Errors
    /// Returns [`KeySetError::Payload`] when the set is empty or a key id repeats.
    pub fn new(keys: Vec<SigningKey>) -> Result<Self, KeySetError> {
        if keys.is_empty() {
            return Err(KeySetError::payload("no recognizable signing keys"));
        }
        let mut seen = HashSet::with_capacity(keys.len());
        for key in &keys {
            if !seen.insert(key.key_id.as_str()) {
                return Err(KeySetError::payload(format!(
                    "duplicate key id '{}'",
                    key.key_id
                )));
            }
        }
        Ok(Self { keys })
    }

    /// Parse a JWKS document (`{"keys": [...]}`).
    ///
    /// Entries that are not RSA signing keys, carry no `kid`, or have
    /// unusable components are skipped.
    ///
    /// # Errors
    /// Returns [`KeySetError::Payload`] if the document is not a JWKS object or
    /// yields no usable keys.
    pub fn from_jwks_json(body: &[u8]) -> Result<Self, KeySetError> {
        let document: JwksDocument = serde_json::from_slice(body)
            .map_err(|e| KeySetError::payload(format!("invalid JWKS document: {e}")))?;

        let mut keys = Vec::with_capacity(document.keys.len());
        for raw in document.keys {
            if let Some(key) = raw.into_signing_key() {
                keys.push(key);
            }
        }
        Self::new(keys)
    }

    #[must_use]
    pub fn find(&self, key_id: &str) -> Option<&SigningKey> {
        self.keys.iter().find(|k| k.key_id == key_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SigningKey> {
        self.keys.iter()
    }

    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.key_id.as_str())
    }
}

#[derive(Deserialize)]
struct JwksDocument {
    keys: Vec<RawJwk>,
}

#[derive(Deserialize)]
struct RawJwk {
    #[serde(default)]
    kty: Option<String>,
    #[serde(default)]
    kid: Option<String>,
    #[serde(default)]
    alg: Option<String>,
    #[serde(default, rename = "use")]
    key_use: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

impl RawJwk {
    fn into_signing_key(self) -> Option<SigningKey> {
        let Some(kid) = self.kid.filter(|k| !k.is_empty()) else {
            tracing::debug!("skipping JWKS entry without kid");
            return None;
        };
        if self.kty.as_deref() != Some("RSA") {
            tracing::debug!(kid = %kid, kty = ?self.kty, "skipping non-RSA JWKS entry");
            return None;
        }
        if self.key_use.as_deref().is_some_and(|u| u != "sig") {
            tracing::debug!(kid = %kid, "skipping JWKS entry not meant for signatures");
            return None;
        }
        let algorithm = match self.alg.as_deref() {
            None => Algorithm::RS256,
            Some(alg) => match Algorithm::from_str(alg) {
                Ok(alg) if is_rsa(alg) => alg,
                _ => {
                    tracing::debug!(kid = %kid, alg, "skipping JWKS entry with unsupported alg");
                    return None;
                }
            },
        };
        let (Some(n), Some(e)) = (self.n, self.e) else {
            tracing::debug!(kid = %kid, "skipping RSA JWKS entry without n/e");
            return None;
        };

        let key = SigningKey::rsa(kid, algorithm, n, e);
        if let Err(err) = key.decoding_key() {
            tracing::debug!(kid = %key.key_id, error = %err, "skipping JWKS entry with unusable components");
            return None;
        }
        Some(key)
    }
}

/// Algorithms that can be verified with RSA components.
#[must_use]
pub fn is_rsa(alg: Algorithm) -> bool {
    matches!(
        alg,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}
