//! Compact token parsing. Nothing here is trusted or verified.

use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::AuthFailure;

/// Token header fields the validator looks at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub typ: Option<String>,
}

/// `aud` may be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    #[must_use]
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Self::One(aud) => aud == expected,
            Self::Many(auds) => auds.iter().any(|a| a == expected),
        }
    }
}

/// Registered claims plus `permissions`. Other claims are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub aud: Option<Audience>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub permissions: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone)]
pub struct DecodedToken {
    header: TokenHeader,
    claims: TokenClaims,
    header_json: Vec<u8>,
    claims_json: Vec<u8>,
    signing_input: Vec<u8>,
    signature: Vec<u8>,
}

impl DecodedToken {
    #[must_use]
    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    #[must_use]
    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    /// `header.claims` exactly as received; the bytes the signature covers.
    #[must_use]
    pub fn signing_input(&self) -> &[u8] {
        &self.signing_input
    }

    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Re-encode the header segment from the retained JSON bytes.
    #[must_use]
    pub fn header_segment(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.header_json)
    }

    /// Re-encode the claims segment from the retained JSON bytes.
    #[must_use]
    pub fn claims_segment(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.claims_json)
    }
}

/// Split and decode a compact token.
///
/// # Errors
/// Returns [`AuthFailure::MalformedToken`] if the token is empty, does not
/// have exactly three segments, or a segment is not valid base64url JSON of
/// the expected shape.
pub fn decode(raw: &str) -> Result<DecodedToken, AuthFailure> {
    if raw.is_empty() {
        return Err(AuthFailure::malformed_token("token is empty"));
    }

    let segments: Vec<&str> = raw.split('.').collect();
    let [header_b64, claims_b64, signature_b64] = segments.as_slice() else {
        return Err(AuthFailure::malformed_token(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    let header_json = decode_segment(header_b64, "header")?;
    let header: TokenHeader = parse_object(&header_json, "header")?;

    let claims_json = decode_segment(claims_b64, "claims")?;
    let claims: TokenClaims = parse_object(&claims_json, "claims")?;

    let signature = decode_segment(signature_b64, "signature")?;
    if signature.is_empty() {
        return Err(AuthFailure::malformed_token("signature is empty"));
    }

    let signing_input = raw.as_bytes()[..header_b64.len() + 1 + claims_b64.len()].to_vec();

    Ok(DecodedToken {
        header,
        claims,
        header_json,
        claims_json,
        signing_input,
        signature,
    })
}

fn decode_segment(segment: &str, what: &str) -> Result<Vec<u8>, AuthFailure> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthFailure::malformed_token(format!("{what} is not base64url: {e}")))
}

fn parse_object<T: DeserializeOwned>(json: &[u8], what: &str) -> Result<T, AuthFailure> {
    let value: serde_json::Value = serde_json::from_slice(json)
        .map_err(|e| AuthFailure::malformed_token(format!("{what} is not JSON: {e}")))?;
    if !value.is_object() {
        return Err(AuthFailure::malformed_token(format!(
            "{what} is not a JSON object"
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| AuthFailure::malformed_token(format!("{what} has unexpected shape: {e}")))
}
