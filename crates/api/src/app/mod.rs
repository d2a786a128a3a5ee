//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: which drink store backs the process
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs and their mapping to domain inputs
//! - `errors.rs`: the shared error envelope

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use coffeeshop_auth::TokenVerifier;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the black-box tests).
pub fn build_app(services: Arc<services::AppServices>, verifier: Arc<dyn TokenVerifier>) -> Router {
    let auth_state = middleware::AuthState::new(verifier);

    routes::router(&auth_state).layer(ServiceBuilder::new().layer(Extension(services)))
}
