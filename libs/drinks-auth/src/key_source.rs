//! Where signing key sets come from.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, StatusCode, Uri, header};
use http_body_util::{BodyExt, Empty, LengthLimitError, Limited};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::error::AuthFailure;
use crate::key_set::SigningKeySet;

/// Largest JWKS document accepted from the endpoint.
pub const MAX_JWKS_BODY_BYTES: usize = 64 * 1024;

/// Low-level failures while obtaining a key set.
///
/// These never leave the key set cache; callers see them as
/// [`AuthFailure::KeySetUnavailable`].
#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("invalid key set url: {0}")]
    InvalidUrl(String),

    #[error("key set request failed: {0}")]
    Transport(String),

    #[error("key set endpoint returned {0}")]
    Status(StatusCode),

    #[error("key set payload is invalid: {0}")]
    Payload(String),

    #[error("key set fetch timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl KeySetError {
    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload(message.into())
    }
}

impl From<KeySetError> for AuthFailure {
    fn from(err: KeySetError) -> Self {
        AuthFailure::key_set_unavailable(err.to_string())
    }
}

/// Supplies the current signing key set.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    /// Fetch the key set.
    ///
    /// # Errors
    /// Returns [`KeySetError`] when the set cannot be obtained or parsed.
    async fn fetch(&self) -> Result<SigningKeySet, KeySetError>;
}

/// Fixed key set, for tests and offline runs.
#[derive(Debug, Clone)]
pub struct StaticKeySetSource {
    keys: SigningKeySet,
}

impl StaticKeySetSource {
    #[must_use]
    pub fn new(keys: SigningKeySet) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl KeySetSource for StaticKeySetSource {
    async fn fetch(&self) -> Result<SigningKeySet, KeySetError> {
        Ok(self.keys.clone())
    }
}

type HttpsClient = Client<HttpsConnector<HttpConnector>, Empty<Bytes>>;

/// Fetches a JWKS document over HTTP(S).
#[derive(Clone)]
pub struct HttpKeySetSource {
    url: Uri,
    client: HttpsClient,
}

impl std::fmt::Debug for HttpKeySetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpKeySetSource")
            .field("url", &self.url.to_string())
            .finish_non_exhaustive()
    }
}

impl HttpKeySetSource {
    /// Build a source for the given JWKS URL.
    ///
    /// Plain `http` is accepted so that local identity providers and test
    /// servers work; production configurations point at `https`.
    ///
    /// # Errors
    /// Returns [`KeySetError::InvalidUrl`] if the URL does not parse or has no
    /// host, and [`KeySetError::Transport`] if TLS cannot be configured.
    pub fn new(url: &str) -> Result<Self, KeySetError> {
        let url: Uri = url
            .parse()
            .map_err(|e| KeySetError::InvalidUrl(format!("{url}: {e}")))?;
        if url.host().is_none() {
            return Err(KeySetError::InvalidUrl(format!("{url}: missing host")));
        }

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::aws_lc_rs::default_provider())
            .map_err(|e| KeySetError::Transport(format!("TLS setup failed: {e}")))?
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self { url, client })
    }

    #[must_use]
    pub fn url(&self) -> &Uri {
        &self.url
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<SigningKeySet, KeySetError> {
        let request = Request::get(self.url.clone())
            .header(header::ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| KeySetError::Transport(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| KeySetError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeySetError::Status(status));
        }

        let body = Limited::new(response.into_body(), MAX_JWKS_BODY_BYTES)
            .collect()
            .await
            .map_err(|e| {
                if e.is::<LengthLimitError>() {
                    KeySetError::payload(format!(
                        "document exceeds {MAX_JWKS_BODY_BYTES} bytes"
                    ))
                } else {
                    KeySetError::Transport(e.to_string())
                }
            })?
            .to_bytes();

        SigningKeySet::from_jwks_json(&body)
    }
}
