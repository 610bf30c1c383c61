//! Bearer token verification and scope enforcement.
//!
//! A request is authorized by [`AuthorizationGate::authorize`], which extracts
//! the bearer token, decodes it, validates signature and claims against the
//! identity provider's signing keys, and checks the required scope. Success
//! yields a [`VerifiedPrincipal`]; anything else is an [`AuthFailure`].

pub mod axum_ext;
pub mod config;
pub mod decoder;
pub mod enforcer;
pub mod error;
pub mod gate;
pub mod key_cache;
pub mod key_set;
pub mod key_source;
pub mod principal;
pub mod validator;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use axum_ext::ErrorEnvelope;
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthFailure, Classification};
pub use gate::{AuthorizationGate, extract_bearer_token};
pub use key_cache::KeySetCache;
pub use key_set::{SigningKey, SigningKeySet};
pub use key_source::{HttpKeySetSource, KeySetError, KeySetSource, StaticKeySetSource};
pub use principal::VerifiedPrincipal;
pub use validator::TokenValidator;
