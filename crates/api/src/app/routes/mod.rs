use axum::{Router, routing::get};

use crate::middleware::AuthState;

pub mod drinks;
pub mod system;

/// Every route of the API. Protected routes carry their own auth layers.
pub fn router(auth: &AuthState) -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(drinks::router(auth))
        .fallback(system::not_found)
}
