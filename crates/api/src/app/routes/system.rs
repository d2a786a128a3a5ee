use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::app::errors::ApiError;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Unknown paths get the same envelope as a missing drink.
pub async fn not_found() -> Response {
    ApiError::NotFound.into_response()
}

/// Known path, unsupported method.
pub async fn method_not_allowed() -> Response {
    ApiError::MethodNotAllowed.into_response()
}
