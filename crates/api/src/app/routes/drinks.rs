use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    middleware::from_fn_with_state,
    routing::{MethodRouter, delete, get, patch, post},
};
use serde_json::{Value, json};

use coffeeshop_auth::{AuthClaims, Permission};
use coffeeshop_core::DrinkId;

use crate::app::dto::DrinkRequest;
use crate::app::errors::ApiError;
use crate::app::routes::system;
use crate::app::services::AppServices;
use crate::middleware::{AuthState, authenticate, require_permission};

pub fn router(auth: &AuthState) -> Router {
    Router::new()
        .route(
            "/drinks",
            get(list_drinks)
                .merge(guarded(post(create_drink), auth, Permission::POST_DRINKS))
                .fallback(system::method_not_allowed),
        )
        .route(
            "/drinks-detail",
            guarded(get(list_drinks_detail), auth, Permission::GET_DRINKS_DETAIL)
                .fallback(system::method_not_allowed),
        )
        .route(
            "/drinks/:id",
            guarded(patch(update_drink), auth, Permission::PATCH_DRINKS)
                .merge(guarded(delete(delete_drink), auth, Permission::DELETE_DRINKS))
                .fallback(system::method_not_allowed),
        )
}

/// Wrap one method route in `authenticate` → `require_permission`.
///
/// The last `route_layer` is the outermost, so the token is verified before
/// the permission is looked at.
fn guarded(route: MethodRouter, auth: &AuthState, required: Permission) -> MethodRouter {
    route
        .route_layer(from_fn_with_state(required, require_permission))
        .route_layer(from_fn_with_state(auth.clone(), authenticate))
}

fn parse_id(raw: &str) -> Result<DrinkId, ApiError> {
    Ok(raw.parse::<DrinkId>()?)
}

fn body_or_validation(body: Result<Json<DrinkRequest>, JsonRejection>) -> Result<DrinkRequest, ApiError> {
    body.map(|Json(b)| b)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

/// GET /drinks: public, short view.
pub async fn list_drinks(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Value>, ApiError> {
    let drinks = services
        .store()
        .list_all()
        .await?
        .iter()
        .map(|d| d.short())
        .collect::<Vec<_>>();

    Ok(Json(json!({ "success": true, "drinks": drinks })))
}

/// GET /drinks-detail: long view.
pub async fn list_drinks_detail(
    Extension(claims): Extension<AuthClaims>,
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Value>, ApiError> {
    tracing::debug!(subject = claims.subject().unwrap_or("<none>"), "listing drink details");

    let drinks = services
        .store()
        .list_all()
        .await?
        .iter()
        .map(|d| d.long())
        .collect::<Vec<_>>();

    Ok(Json(json!({ "success": true, "drinks": drinks })))
}

/// POST /drinks. The created drink comes back as a one-element list under `drink`.
pub async fn create_drink(
    Extension(claims): Extension<AuthClaims>,
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<DrinkRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let new_drink = body_or_validation(body)?.into_new_drink()?;
    let drink = services.store().create(new_drink).await?;

    tracing::info!(
        subject = claims.subject().unwrap_or("<none>"),
        drink_id = %drink.id_typed(),
        "drink created"
    );
    Ok(Json(json!({ "success": true, "drink": [drink.long()] })))
}

/// PATCH /drinks/{id}. Title and recipe are applied independently.
pub async fn update_drink(
    Extension(claims): Extension<AuthClaims>,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<DrinkRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let current = services
        .store()
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let patch = body_or_validation(body)?.into_patch()?;
    let drink = if patch.is_empty() {
        current
    } else {
        services.store().update(id, patch).await?
    };

    tracing::info!(
        subject = claims.subject().unwrap_or("<none>"),
        drink_id = %id,
        "drink updated"
    );
    Ok(Json(json!({ "success": true, "drinks": [drink.long()] })))
}

/// DELETE /drinks/{id}
pub async fn delete_drink(
    Extension(claims): Extension<AuthClaims>,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    services.store().delete(id).await?;

    tracing::info!(
        subject = claims.subject().unwrap_or("<none>"),
        drink_id = %id,
        "drink deleted"
    );
    Ok(Json(json!({ "success": true, "delete": id })))
}
