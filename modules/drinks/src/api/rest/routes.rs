use std::sync::Arc;

use axum::routing::{get, patch};
use axum::{Extension, Router};
use drinks_auth::AuthorizationGate;

use crate::api::rest::error::ApiError;
use crate::api::rest::handlers;
use crate::domain::service::DrinkService;

/// Build the drinks router.
///
/// | Method | Path             | Scope               |
/// |--------|------------------|---------------------|
/// | GET    | `/drinks`        | public              |
/// | GET    | `/drinks-detail` | `get:drinks-detail` |
/// | POST   | `/drinks`        | `post:drinks`       |
/// | PATCH  | `/drinks/{id}`   | `patch:drinks`      |
/// | DELETE | `/drinks/{id}`   | `delete:drinks`     |
#[must_use]
pub fn router(service: Arc<DrinkService>, gate: Arc<AuthorizationGate>) -> Router {
    Router::new()
        .route(
            "/drinks",
            get(handlers::list_drinks).post(handlers::create_drink),
        )
        .route("/drinks-detail", get(handlers::list_drink_details))
        .route(
            "/drinks/{id}",
            patch(handlers::update_drink).delete(handlers::delete_drink),
        )
        .fallback(|| async { ApiError::NotFound })
        .method_not_allowed_fallback(|| async { ApiError::MethodNotAllowed })
        .layer(Extension(service))
        .layer(Extension(gate))
}
