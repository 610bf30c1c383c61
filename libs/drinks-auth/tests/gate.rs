#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end authorization through the gate with an in-process key source.

use std::sync::Arc;
use std::time::Duration;

use drinks_auth::testutil::{
    CountingSource, TEST_AUDIENCE, TEST_ISSUER, mint_token, standard_claims, tamper_signature,
    mint_token_with_header, test_key_set, test_key_set_with,
};
use drinks_auth::{
    AuthFailure, AuthorizationGate, Classification, KeySetCache, KeySetSource, TokenValidator,
};

fn gate_over(source: &Arc<CountingSource>, ttl: Duration) -> AuthorizationGate {
    let cache = KeySetCache::new(
        Arc::clone(source) as Arc<dyn KeySetSource>,
        ttl,
        Duration::from_secs(1),
    );
    AuthorizationGate::new(Arc::new(cache), TokenValidator::new(TEST_ISSUER, TEST_AUDIENCE))
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[tokio::test]
async fn scenario_missing_header_is_unauthorized() {
    let source = CountingSource::new(test_key_set("K1")).shared();
    let gate = gate_over(&source, Duration::from_secs(60));

    let err = gate.authorize(None, "get:drinks-detail").await.unwrap_err();
    assert_eq!(err, AuthFailure::MissingHeader);
    assert_eq!(err.classification(), Classification::Unauthorized);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn scenario_wrong_scheme_is_malformed_header() {
    let source = CountingSource::new(test_key_set("K1")).shared();
    let gate = gate_over(&source, Duration::from_secs(60));

    let err = gate
        .authorize(Some("Token abc.def.ghi"), "get:drinks-detail")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthFailure::MalformedHeader { .. }));
    assert_eq!(err.classification(), Classification::Unauthorized);
}

#[tokio::test]
async fn scenario_valid_token_with_scope_yields_principal() {
    let source = CountingSource::new(test_key_set("K1")).shared();
    let gate = gate_over(&source, Duration::from_secs(60));
    let token = mint_token(
        "K1",
        &standard_claims("auth0|barista", &["get:drinks-detail"], 3600),
    );

    let principal = gate
        .authorize(Some(&bearer(&token)), "get:drinks-detail")
        .await
        .unwrap();
    assert_eq!(principal.subject(), "auth0|barista");
    assert_eq!(principal.permissions().len(), 1);
    assert!(principal.has_permission("get:drinks-detail"));
}

#[tokio::test]
async fn scenario_valid_token_without_scope_is_forbidden() {
    let source = CountingSource::new(test_key_set("K1")).shared();
    let gate = gate_over(&source, Duration::from_secs(60));
    let token = mint_token(
        "K1",
        &standard_claims("auth0|barista", &["get:drinks-detail"], 3600),
    );

    let err = gate
        .authorize(Some(&bearer(&token)), "delete:drinks")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AuthFailure::PermissionDenied {
            scope: "delete:drinks".into()
        }
    );
    assert_eq!(err.classification(), Classification::Forbidden);
}

#[tokio::test]
async fn unknown_kid_triggers_exactly_one_refetch() {
    let source = CountingSource::new(test_key_set("K1")).shared();
    let gate = gate_over(&source, Duration::from_secs(60));
    let token = mint_token("K-unknown", &standard_claims("user", &["post:drinks"], 3600));

    let err = gate
        .authorize(Some(&bearer(&token)), "post:drinks")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AuthFailure::KeyNotFound {
            kid: "K-unknown".into()
        }
    );
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn rotated_key_is_picked_up_on_refetch() {
    let source = CountingSource::sequence(vec![
        Some(test_key_set("K1")),
        Some(test_key_set_with(&["K1", "K2"])),
    ])
    .shared();
    let gate = gate_over(&source, Duration::from_secs(60));

    let old = mint_token("K1", &standard_claims("user", &["post:drinks"], 3600));
    gate.authorize(Some(&bearer(&old)), "post:drinks")
        .await
        .unwrap();

    let rotated = mint_token("K2", &standard_claims("user", &["post:drinks"], 3600));
    gate.authorize(Some(&bearer(&rotated)), "post:drinks")
        .await
        .unwrap();
    assert_eq!(source.calls(), 2);
    assert_eq!(gate.key_cache().fetch_count(), 2);
}

#[tokio::test]
async fn expired_token_is_rejected_regardless_of_signature() {
    let source = CountingSource::new(test_key_set("K1")).shared();
    let gate = gate_over(&source, Duration::from_secs(60));
    let expired = mint_token("K1", &standard_claims("user", &["post:drinks"], -1));

    for token in [expired.clone(), tamper_signature(&expired)] {
        let err = gate
            .authorize(Some(&bearer(&token)), "post:drinks")
            .await
            .unwrap_err();
        assert_eq!(err, AuthFailure::TokenExpired);
    }
}

#[tokio::test]
async fn bad_signature_is_rejected() {
    let source = CountingSource::new(test_key_set("K1")).shared();
    let gate = gate_over(&source, Duration::from_secs(60));
    let token = mint_token("K1", &standard_claims("user", &["post:drinks"], 3600));

    let err = gate
        .authorize(Some(&bearer(&tamper_signature(&token))), "post:drinks")
        .await
        .unwrap_err();
    assert_eq!(err, AuthFailure::InvalidSignature);
}

#[tokio::test]
async fn malformed_token_never_reaches_the_key_set() {
    let source = CountingSource::new(test_key_set("K1")).shared();
    let gate = gate_over(&source, Duration::from_secs(60));

    let err = gate
        .authorize(Some("Bearer not-a-jwt"), "post:drinks")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthFailure::MalformedToken { .. }));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn header_without_alg_is_invalid_header_before_any_fetch() {
    let source = CountingSource::new(test_key_set("K1")).shared();
    let gate = gate_over(&source, Duration::from_secs(60));
    let token = mint_token_with_header(
        &serde_json::json!({ "kid": "K1" }),
        &standard_claims("user", &["post:drinks"], 3600),
    );

    let err = gate
        .authorize(Some(&bearer(&token)), "post:drinks")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthFailure::InvalidHeader { .. }));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn key_set_outage_is_unauthorized() {
    let source = CountingSource::failing().shared();
    let gate = gate_over(&source, Duration::from_secs(60));
    let token = mint_token("K1", &standard_claims("user", &["post:drinks"], 3600));

    let err = gate
        .authorize(Some(&bearer(&token)), "post:drinks")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthFailure::KeySetUnavailable { .. }));
    assert_eq!(err.classification(), Classification::Unauthorized);
}

#[tokio::test]
async fn zero_ttl_fetches_per_check() {
    let source = CountingSource::new(test_key_set("K1")).shared();
    let gate = gate_over(&source, Duration::ZERO);
    let token = mint_token("K1", &standard_claims("user", &["post:drinks"], 3600));

    for _ in 0..3 {
        gate.authorize(Some(&bearer(&token)), "post:drinks")
            .await
            .unwrap();
    }
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn principal_carries_exactly_the_granted_permissions() {
    let source = CountingSource::new(test_key_set("K1")).shared();
    let gate = gate_over(&source, Duration::from_secs(60));
    let granted = ["delete:drinks", "get:drinks-detail", "patch:drinks", "post:drinks"];
    let token = mint_token("K1", &standard_claims("auth0|manager", &granted, 3600));

    let principal = gate
        .authorize(Some(&bearer(&token)), "patch:drinks")
        .await
        .unwrap();
    let got: Vec<&str> = principal.permissions().iter().map(String::as_str).collect();
    assert_eq!(got, granted);
}
