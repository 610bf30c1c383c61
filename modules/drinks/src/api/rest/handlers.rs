//! Drinks REST handlers.
//!
//! Protected handlers call the authorization gate before anything else; the
//! request body and path are only looked at once the caller is authorized.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path};
use axum::http::HeaderMap;
use drinks_auth::AuthorizationGate;
use tracing::info;

use crate::api::rest::dto::{
    CreateDrinkRequest, DeletedResponse, DrinksResponse, LongDrinkDto, ShortDrinkDto,
    UpdateDrinkRequest,
};
use crate::api::rest::error::ApiResult;
use crate::domain::service::DrinkService;
use crate::scopes;

/// Public listing in the short representation.
pub async fn list_drinks(
    Extension(svc): Extension<Arc<DrinkService>>,
) -> ApiResult<Json<DrinksResponse<ShortDrinkDto>>> {
    let drinks = svc.list().await?;
    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(Into::into).collect(),
    )))
}

/// Listing in the long representation; requires `get:drinks-detail`.
pub async fn list_drink_details(
    Extension(gate): Extension<Arc<AuthorizationGate>>,
    Extension(svc): Extension<Arc<DrinkService>>,
    headers: HeaderMap,
) -> ApiResult<Json<DrinksResponse<LongDrinkDto>>> {
    gate.authorize_headers(&headers, scopes::GET_DRINKS_DETAIL)
        .await?;

    let drinks = svc.list().await?;
    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(Into::into).collect(),
    )))
}

/// Create a drink; requires `post:drinks`.
pub async fn create_drink(
    Extension(gate): Extension<Arc<AuthorizationGate>>,
    Extension(svc): Extension<Arc<DrinkService>>,
    headers: HeaderMap,
    body: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> ApiResult<Json<DrinksResponse<LongDrinkDto>>> {
    let principal = gate.authorize_headers(&headers, scopes::POST_DRINKS).await?;
    let Json(req) = body?;

    info!(subject = %principal.subject(), title = %req.title, "creating drink");
    let drink = svc.create(req.into()).await?;
    Ok(Json(DrinksResponse::new(vec![drink.into()])))
}

/// Patch a drink; requires `patch:drinks`.
pub async fn update_drink(
    Extension(gate): Extension<Arc<AuthorizationGate>>,
    Extension(svc): Extension<Arc<DrinkService>>,
    path: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
    body: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> ApiResult<Json<DrinksResponse<LongDrinkDto>>> {
    let principal = gate.authorize_headers(&headers, scopes::PATCH_DRINKS).await?;
    let Path(id) = path?;
    let Json(req) = body?;

    info!(subject = %principal.subject(), drink_id = id, "updating drink");
    let drink = svc.update(id, req.into()).await?;
    Ok(Json(DrinksResponse::new(vec![drink.into()])))
}

/// Delete a drink; requires `delete:drinks`.
pub async fn delete_drink(
    Extension(gate): Extension<Arc<AuthorizationGate>>,
    Extension(svc): Extension<Arc<DrinkService>>,
    path: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
) -> ApiResult<Json<DeletedResponse>> {
    let principal = gate.authorize_headers(&headers, scopes::DELETE_DRINKS).await?;
    let Path(id) = path?;

    info!(subject = %principal.subject(), drink_id = id, "deleting drink");
    let deleted = svc.delete(id).await?;
    Ok(Json(DeletedResponse {
        success: true,
        deleted,
    }))
}
