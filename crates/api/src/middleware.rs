//! Authorization middleware.
//!
//! Protected routes are wrapped as `authenticate` → `require_permission` →
//! handler. `authenticate` verifies the bearer token and stores the
//! resulting [`AuthClaims`] in the request extensions; `require_permission`
//! checks them against the route's permission. Handlers then receive the
//! claims through `Extension<AuthClaims>`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use coffeeshop_auth::{AuthClaims, AuthError, Permission, TokenVerifier};

use crate::app::errors::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AuthState {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }
}

pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let header = match req.headers().get(AUTHORIZATION).map(|v| v.to_str()) {
        None => None,
        Some(Ok(value)) => Some(value.to_owned()),
        Some(Err(_)) => {
            return ApiError::from(AuthError::malformed_header(
                "Authorization header must start with \"Bearer\".",
            ))
            .into_response();
        }
    };

    let claims =
        match coffeeshop_auth::authenticate(state.verifier.as_ref(), header.as_deref()).await {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!(
                    code = %err.code(),
                    status = err.status(),
                    path = %req.uri().path(),
                    "rejected bearer token"
                );
                return ApiError::from(err).into_response();
            }
        };

    req.extensions_mut().insert(claims);
    next.run(req).await
}

pub async fn require_permission(
    State(required): State<Permission>,
    req: Request,
    next: Next,
) -> Response {
    let Some(claims) = req.extensions().get::<AuthClaims>() else {
        // Mounted without `authenticate` in front of it.
        tracing::warn!(%required, "permission check reached without verified claims");
        return ApiError::from(AuthError::missing_header()).into_response();
    };

    if let Err(err) = coffeeshop_auth::check_permission(claims, &required) {
        return ApiError::from(err).into_response();
    }

    next.run(req).await
}
