//! Error envelopes.
//!
//! Every failure leaves the API as
//! `{"success": false, "error": <status>, "message": <text>}` with the same
//! status on the response line.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use coffeeshop_auth::AuthError;
use coffeeshop_core::DomainError;
use coffeeshop_infra::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected by the authorization flow; surfaced verbatim.
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("resource not found")]
    NotFound,

    /// Known path, unsupported method.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Malformed or rejected create/update payload.
    #[error("unprocessable: {0}")]
    Validation(String),

    /// Any other store failure. Logged, then flattened to a 404.
    #[error("store failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Validation(msg) => ApiError::Validation(msg),
            other => ApiError::Store(other),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidId(_) => ApiError::NotFound,
            DomainError::Validation(msg) => ApiError::Validation(msg),
            DomainError::Corrupt(msg) => ApiError::Store(StoreError::Corrupt(msg)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(err) => {
                let status =
                    StatusCode::from_u16(err.status()).unwrap_or(StatusCode::UNAUTHORIZED);
                json_error(status, err.description())
            }
            ApiError::NotFound => json_error(StatusCode::NOT_FOUND, "resource not found"),
            ApiError::MethodNotAllowed => {
                json_error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
            }
            ApiError::Validation(msg) => {
                json_error(StatusCode::UNPROCESSABLE_ENTITY, format!("unprocessable: {msg}"))
            }
            ApiError::Store(err) => {
                tracing::error!("store failure: {err}");
                json_error(StatusCode::NOT_FOUND, "resource not found")
            }
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": status.as_u16(),
            "message": message.into(),
        })),
    )
        .into_response()
}
