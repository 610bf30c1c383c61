#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Key set retrieval over HTTP against a local JWKS endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use drinks_auth::testutil::{TEST_AUDIENCE, mint_token, standard_claims, test_jwks};
use drinks_auth::key_source::MAX_JWKS_BODY_BYTES;
use drinks_auth::{
    AuthConfig, AuthFailure, AuthorizationGate, HttpKeySetSource, KeySetError, KeySetSource,
};
use serde_json::{Value, json};
use tokio::sync::RwLock;

struct JwksEndpoint {
    response: RwLock<(StatusCode, Value)>,
    hits: AtomicUsize,
}

impl JwksEndpoint {
    async fn set(&self, status: StatusCode, body: Value) {
        *self.response.write().await = (status, body);
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve_jwks(State(endpoint): State<Arc<JwksEndpoint>>) -> (StatusCode, Json<Value>) {
    endpoint.hits.fetch_add(1, Ordering::SeqCst);
    let (status, body) = endpoint.response.read().await.clone();
    (status, Json(body))
}

/// Spawn the endpoint on an ephemeral port; returns its JWKS URL.
async fn spawn_jwks(status: StatusCode, body: Value) -> (String, Arc<JwksEndpoint>) {
    let endpoint = Arc::new(JwksEndpoint {
        response: RwLock::new((status, body)),
        hits: AtomicUsize::new(0),
    });
    let app = Router::new()
        .route("/.well-known/jwks.json", get(serve_jwks))
        .with_state(Arc::clone(&endpoint));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/.well-known/jwks.json"), endpoint)
}

fn config_for(jwks_url: &str, ttl_secs: u64) -> AuthConfig {
    AuthConfig {
        jwks_url: jwks_url.to_owned(),
        issuer: drinks_auth::testutil::TEST_ISSUER.to_owned(),
        audience: TEST_AUDIENCE.to_owned(),
        key_set_ttl_secs: ttl_secs,
        fetch_timeout_ms: 2_000,
        ..AuthConfig::default()
    }
}

#[tokio::test]
async fn fetches_and_parses_jwks() {
    let (url, endpoint) = spawn_jwks(StatusCode::OK, test_jwks(&["K1", "K2"])).await;
    let source = HttpKeySetSource::new(&url).unwrap();

    let keys = source.fetch().await.unwrap();
    assert_eq!(keys.key_ids().collect::<Vec<_>>(), vec!["K1", "K2"]);
    assert_eq!(endpoint.hits(), 1);
}

#[tokio::test]
async fn error_status_and_bad_payloads_fail_the_fetch() {
    let (url, endpoint) = spawn_jwks(StatusCode::SERVICE_UNAVAILABLE, json!({})).await;
    let source = HttpKeySetSource::new(&url).unwrap();
    assert!(source.fetch().await.is_err());

    endpoint.set(StatusCode::OK, json!({ "keys": [] })).await;
    assert!(source.fetch().await.is_err());

    endpoint
        .set(StatusCode::OK, json!({ "keys": [{ "kty": "oct", "kid": "x" }] }))
        .await;
    assert!(source.fetch().await.is_err());
}

#[tokio::test]
async fn oversized_document_is_rejected_as_payload() {
    let mut jwks = test_jwks(&["K1"]);
    jwks["padding"] = json!("x".repeat(MAX_JWKS_BODY_BYTES));
    let (url, endpoint) = spawn_jwks(StatusCode::OK, jwks).await;
    let source = HttpKeySetSource::new(&url).unwrap();

    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, KeySetError::Payload(_)), "{err}");
    assert_eq!(endpoint.hits(), 1);
}

#[tokio::test]
async fn gate_from_config_verifies_against_remote_keys() {
    let (url, endpoint) = spawn_jwks(StatusCode::OK, test_jwks(&["K1"])).await;
    let gate = AuthorizationGate::from_config(&config_for(&url, 300)).unwrap();
    let token = mint_token("K1", &standard_claims("auth0|remote", &["post:drinks"], 600));
    let header = format!("Bearer {token}");

    for _ in 0..3 {
        let principal = gate.authorize(Some(&header), "post:drinks").await.unwrap();
        assert_eq!(principal.subject(), "auth0|remote");
    }
    assert_eq!(endpoint.hits(), 1);
}

#[tokio::test]
async fn remote_outage_is_key_set_unavailable() {
    let (url, _endpoint) = spawn_jwks(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;
    let gate = AuthorizationGate::from_config(&config_for(&url, 300)).unwrap();
    let token = mint_token("K1", &standard_claims("user", &["post:drinks"], 600));

    let err = gate
        .authorize(Some(&format!("Bearer {token}")), "post:drinks")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthFailure::KeySetUnavailable { .. }));
}

#[tokio::test]
async fn rotation_is_visible_after_refetch() {
    let (url, endpoint) = spawn_jwks(StatusCode::OK, test_jwks(&["K1"])).await;
    let gate = AuthorizationGate::from_config(&config_for(&url, 300)).unwrap();

    let first = mint_token("K1", &standard_claims("user", &["post:drinks"], 600));
    gate.authorize(Some(&format!("Bearer {first}")), "post:drinks")
        .await
        .unwrap();

    endpoint.set(StatusCode::OK, test_jwks(&["K2"])).await;
    let rotated = mint_token("K2", &standard_claims("user", &["post:drinks"], 600));
    gate.authorize(Some(&format!("Bearer {rotated}")), "post:drinks")
        .await
        .unwrap();
    assert_eq!(endpoint.hits(), 2);
}
